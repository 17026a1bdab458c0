pub mod metrics;

pub use metrics::*;

use crate::advection::{advect, AdvectionMap};
use crate::config::{SimParams, SimParamsError};
use crate::field::{initialize_with_rng, GridField, ShapeMismatch};
use crate::reaction::{ReactionKernel, ReactionScratch};
use crate::spectrum::SpectrumAnalyzer;
use log::{debug, info, trace, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::sync::Arc;
use std::time::Instant;
use std::{error::Error, fmt};

/// Lifecycle of a run. A run is uninitialized until a [`Simulation`] exists;
/// construction builds fields and map in one go and lands in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Ready,
    Ticking,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    Params(SimParamsError),
    Shape(ShapeMismatch),
    RunComplete { ticks: usize },
    InvalidSampleEvery,
    TooManyTicks { max: usize, actual: usize },
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Params(e) => write!(f, "{}", e),
            SimulationError::Shape(e) => write!(f, "{}", e),
            SimulationError::RunComplete { ticks } => {
                write!(f, "run already completed after {ticks} ticks")
            }
            SimulationError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            SimulationError::TooManyTicks { max, actual } => {
                write!(f, "ticks ({actual}) exceed remaining ticks in run ({max})")
            }
        }
    }
}

impl From<SimParamsError> for SimulationError {
    fn from(err: SimParamsError) -> Self {
        SimulationError::Params(err)
    }
}

impl From<ShapeMismatch> for SimulationError {
    fn from(err: ShapeMismatch) -> Self {
        SimulationError::Shape(err)
    }
}

impl Error for SimulationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimulationError::Params(e) => Some(e),
            SimulationError::Shape(e) => Some(e),
            _ => None,
        }
    }
}

/// Advance one visual tick: at most one advection pass, then
/// `steps_per_frame` synchronous Euler sub-steps.
fn advance(
    gas: &mut GridField,
    radiation: &mut GridField,
    map: Option<&AdvectionMap>,
    kernel: &ReactionKernel,
    steps_per_frame: usize,
    scratch: &mut ReactionScratch,
) -> TickTimings {
    let total_start = Instant::now();

    let t0 = Instant::now();
    if let Some(map) = map {
        *gas = advect(gas, map);
        *radiation = advect(radiation, map);
    }
    let advection_us = t0.elapsed().as_micros() as u64;

    let t1 = Instant::now();
    for _ in 0..steps_per_frame {
        kernel.sub_step(gas, radiation, scratch);
    }
    let reaction_us = t1.elapsed().as_micros() as u64;

    TickTimings {
        advection_us,
        reaction_us,
        total_us: total_start.elapsed().as_micros() as u64,
    }
}

/// Stateless tick over caller-owned fields, updated in place; the returned
/// pair borrows the same fields. `map` alone decides whether advection runs;
/// `params.with_advection` is not consulted.
pub fn try_tick<'a>(
    gas: &'a mut GridField,
    radiation: &'a mut GridField,
    map: Option<&AdvectionMap>,
    params: &SimParams,
) -> Result<(&'a GridField, &'a GridField), ShapeMismatch> {
    gas.ensure_same_shape(radiation)?;
    if let Some(map) = map {
        map.ensure_matches(gas)?;
    }
    let kernel = ReactionKernel::from_params(params);
    let mut scratch = ReactionScratch::new(gas.size());
    advance(gas, radiation, map, &kernel, params.steps_per_frame, &mut scratch);
    Ok((&*gas, &*radiation))
}

pub fn tick<'a>(
    gas: &'a mut GridField,
    radiation: &'a mut GridField,
    map: Option<&AdvectionMap>,
    params: &SimParams,
) -> (&'a GridField, &'a GridField) {
    try_tick(gas, radiation, map, params).unwrap_or_else(|e| panic!("{e}"))
}

/// Owns both fields and the parameters of one run; holds the advection map
/// read-only so several runs may share it.
pub struct Simulation {
    pub(crate) params: SimParams,
    pub(crate) gas: GridField,
    pub(crate) radiation: GridField,
    pub(crate) advection: Option<Arc<AdvectionMap>>,
    pub(crate) kernel: ReactionKernel,
    pub(crate) scratch: ReactionScratch,
    pub(crate) analyzer: SpectrumAnalyzer,
    pub(crate) phase: RunPhase,
    pub(crate) tick_index: usize,
    pub(crate) reported_non_finite: bool,
}

impl Simulation {
    pub fn new(params: SimParams) -> Self {
        Self::try_new(params).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Seed fields from `params.seed` and build the map when advection is enabled.
    pub fn try_new(params: SimParams) -> Result<Self, SimulationError> {
        params.validate()?;
        let map = params
            .with_advection
            .then(|| Arc::new(AdvectionMap::build(params.grid_size, params.rotation_strength)));
        Self::try_with_map(params, map)
    }

    /// Like [`try_new`](Self::try_new) but reuses an already built map.
    pub fn try_with_map(
        params: SimParams,
        map: Option<Arc<AdvectionMap>>,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        let mut rng = ChaCha12Rng::seed_from_u64(params.seed);
        let (gas, radiation) = initialize_with_rng(
            params.grid_size,
            params.seed_radius,
            params.noise_level,
            &mut rng,
        );
        Self::try_from_fields(params, gas, radiation, map)
    }

    /// Start from caller-supplied fields. Shapes of both fields and the map must agree.
    pub fn try_from_fields(
        params: SimParams,
        gas: GridField,
        radiation: GridField,
        map: Option<Arc<AdvectionMap>>,
    ) -> Result<Self, SimulationError> {
        params.validate()?;
        gas.ensure_same_shape(&radiation)?;
        if let Some(map) = &map {
            map.ensure_matches(&gas)?;
        }

        let size = gas.size();
        debug!(
            "simulation ready: {size}x{size} grid, advection={}, {} sub-steps/tick, {} ticks",
            map.is_some(),
            params.steps_per_frame,
            params.num_frames
        );
        Ok(Self {
            kernel: ReactionKernel::from_params(&params),
            scratch: ReactionScratch::new(size),
            analyzer: SpectrumAnalyzer::new(size),
            params,
            gas,
            radiation,
            advection: map,
            phase: RunPhase::Ready,
            tick_index: 0,
            reported_non_finite: false,
        })
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn gas(&self) -> &GridField {
        &self.gas
    }

    pub fn radiation(&self) -> &GridField {
        &self.radiation
    }

    pub fn advection_map(&self) -> Option<&Arc<AdvectionMap>> {
        self.advection.as_ref()
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn ticks_done(&self) -> usize {
        self.tick_index
    }

    pub fn remaining_ticks(&self) -> usize {
        self.params.num_frames.saturating_sub(self.tick_index)
    }

    /// Advance one tick and return `(gas, radiation)` for display.
    pub fn tick(&mut self) -> (&GridField, &GridField) {
        if let Err(e) = self.try_tick_timed() {
            panic!("{e}");
        }
        (&self.gas, &self.radiation)
    }

    pub fn try_tick(&mut self) -> Result<(&GridField, &GridField), SimulationError> {
        self.try_tick_timed()?;
        Ok((&self.gas, &self.radiation))
    }

    /// Advance one tick and report where the time went.
    pub fn try_tick_timed(&mut self) -> Result<TickTimings, SimulationError> {
        if self.phase == RunPhase::Done {
            return Err(SimulationError::RunComplete {
                ticks: self.tick_index,
            });
        }
        self.phase = RunPhase::Ticking;

        let timings = advance(
            &mut self.gas,
            &mut self.radiation,
            self.advection.as_deref(),
            &self.kernel,
            self.params.steps_per_frame,
            &mut self.scratch,
        );
        self.tick_index += 1;
        trace!("tick {} took {}us", self.tick_index, timings.total_us);

        if !self.reported_non_finite {
            let bad = self.gas.non_finite_count() + self.radiation.non_finite_count();
            if bad > 0 {
                warn!(
                    "{bad} non-finite cells after tick {}; parameters are outside the stable regime",
                    self.tick_index
                );
                self.reported_non_finite = true;
            }
        }

        if self.tick_index >= self.params.num_frames {
            self.phase = RunPhase::Done;
            info!("run complete after {} ticks", self.tick_index);
        }
        Ok(timings)
    }

    /// Log-magnitude spectrum of the current gas field.
    pub fn spectrum(&self) -> GridField {
        self.analyzer
            .analyze(&self.gas)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn run_experiment(&mut self, ticks: usize, sample_every: usize) -> RunSummary {
        self.try_run_experiment(ticks, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance `ticks` ticks, sampling metrics every `sample_every` ticks and
    /// at the last one.
    pub fn try_run_experiment(
        &mut self,
        ticks: usize,
        sample_every: usize,
    ) -> Result<RunSummary, SimulationError> {
        if sample_every == 0 {
            return Err(SimulationError::InvalidSampleEvery);
        }
        let remaining = self.remaining_ticks();
        if ticks > remaining {
            return Err(SimulationError::TooManyTicks {
                max: remaining,
                actual: ticks,
            });
        }

        let first_tick = self.tick_index;
        let estimated_samples = if ticks == 0 {
            0
        } else {
            ((ticks - 1) / sample_every) + 1
        };
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=ticks {
            self.try_tick_timed()?;
            if step % sample_every == 0 || step == ticks {
                samples.push(self.collect_tick_metrics());
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            first_tick,
            ticks,
            sample_every,
            with_advection: self.advection.is_some(),
            params: self.params.clone(),
            samples,
        })
    }
}
