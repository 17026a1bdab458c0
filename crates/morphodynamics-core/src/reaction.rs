//! Gray–Scott style reaction terms for the gas/radiation pair.
//!
//! Gas is replenished toward 1 at rate `feed` and consumed by the coupling
//! `eta * G * R^2`; radiation is produced by the coupling and removed at
//! `feed + kill`. No clamping: poorly chosen parameters may diverge.

use crate::config::SimParams;
use crate::field::GridField;
use crate::laplacian::laplacian_into;
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReactionKernel {
    pub diff_gas: f32,
    pub diff_radiation: f32,
    pub feed: f32,
    pub kill: f32,
    pub eta: f32,
    pub dt: f32,
}

impl ReactionKernel {
    pub fn from_params(params: &SimParams) -> Self {
        Self {
            diff_gas: params.diff_gas,
            diff_radiation: params.diff_radiation,
            feed: params.feed,
            kill: params.kill,
            eta: params.eta,
            dt: params.dt,
        }
    }

    /// Per-cell deltas given the cell's values and Laplacians.
    #[inline]
    pub fn cell_deltas(&self, g: f32, r: f32, lap_g: f32, lap_r: f32) -> (f32, f32) {
        let gr2 = self.eta * g * (r * r);
        let delta_g = (self.diff_gas * lap_g - gr2 + self.feed * (1.0 - g)) * self.dt;
        let delta_r = (self.diff_radiation * lap_r + gr2 - (self.feed + self.kill) * r) * self.dt;
        (delta_g, delta_r)
    }

    /// Compute `(delta_G, delta_R)` from one consistent snapshot of both fields.
    pub fn deltas(&self, gas: &GridField, radiation: &GridField) -> (GridField, GridField) {
        let mut scratch = ReactionScratch::new(gas.size());
        self.deltas_into(gas, radiation, &mut scratch);
        (scratch.delta_gas, scratch.delta_radiation)
    }

    /// Like [`deltas`](Self::deltas) but reuses `scratch` buffers. Inputs are only read.
    pub fn deltas_into(&self, gas: &GridField, radiation: &GridField, scratch: &mut ReactionScratch) {
        debug_assert_eq!(gas.size(), radiation.size());
        laplacian_into(gas, &mut scratch.lap_gas);
        laplacian_into(radiation, &mut scratch.lap_radiation);

        let g = gas.data();
        let r = radiation.data();
        let lap_g = scratch.lap_gas.data();
        let lap_r = scratch.lap_radiation.data();

        scratch
            .delta_gas
            .data_mut()
            .par_iter_mut()
            .zip(scratch.delta_radiation.data_mut().par_iter_mut())
            .enumerate()
            .for_each(|(idx, (dg, dr))| {
                (*dg, *dr) = self.cell_deltas(g[idx], r[idx], lap_g[idx], lap_r[idx]);
            });
    }

    /// One synchronous explicit Euler sub-step: both deltas are computed before
    /// either field is written.
    pub fn sub_step(&self, gas: &mut GridField, radiation: &mut GridField, scratch: &mut ReactionScratch) {
        self.deltas_into(gas, radiation, scratch);
        gas.add_assign(&scratch.delta_gas);
        radiation.add_assign(&scratch.delta_radiation);
    }
}

/// Reusable buffers for the Laplacians and deltas of one sub-step.
#[derive(Clone, Debug)]
pub struct ReactionScratch {
    lap_gas: GridField,
    lap_radiation: GridField,
    delta_gas: GridField,
    delta_radiation: GridField,
}

impl ReactionScratch {
    pub fn new(size: usize) -> Self {
        Self {
            lap_gas: GridField::new(size, 0.0),
            lap_radiation: GridField::new(size, 0.0),
            delta_gas: GridField::new(size, 0.0),
            delta_radiation: GridField::new(size, 0.0),
        }
    }

    pub fn delta_gas(&self) -> &GridField {
        &self.delta_gas
    }

    pub fn delta_radiation(&self) -> &GridField {
        &self.delta_radiation
    }
}
