use super::Simulation;
use crate::config::SimParams;
use crate::field::GridField;
use crate::spectrum::dominant_wavenumber;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct TickTimings {
    pub advection_us: u64,
    pub reaction_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FieldStats {
    pub mean: f64,
    pub min: f32,
    pub max: f32,
    pub total: f64,
}

impl FieldStats {
    pub fn of(field: &GridField) -> Self {
        let (min, max) = field.min_max();
        Self {
            mean: field.mean(),
            min,
            max,
            total: field.total(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TickMetrics {
    pub tick: usize,
    pub gas: FieldStats,
    pub radiation: FieldStats,
    /// Sum of gas and radiation over the grid.
    pub total_mass: f64,
    /// Characteristic pattern scale read off the gas spectrum.
    pub dominant_wavenumber: f32,
    pub non_finite_cells: usize,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Ticks already done before this experiment started.
    #[serde(default)]
    pub first_tick: usize,
    pub ticks: usize,
    pub sample_every: usize,
    pub with_advection: bool,
    #[serde(default)]
    pub params: SimParams,
    pub samples: Vec<TickMetrics>,
}

impl Simulation {
    pub fn collect_tick_metrics(&self) -> TickMetrics {
        let gas = FieldStats::of(&self.gas);
        let radiation = FieldStats::of(&self.radiation);
        TickMetrics {
            tick: self.tick_index,
            total_mass: gas.total + radiation.total,
            gas,
            radiation,
            dominant_wavenumber: dominant_wavenumber(&self.spectrum()),
            non_finite_cells: self.gas.non_finite_count() + self.radiation.non_finite_count(),
        }
    }
}
