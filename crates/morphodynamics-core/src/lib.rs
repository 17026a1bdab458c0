//! Two-field reaction–diffusion–advection toy model on a periodic grid.
//!
//! Gas (activator) and radiation (inhibitor) evolve under a Gray–Scott style
//! reaction, 5-point diffusion and a semi-Lagrangian differential rotation.
//! A presentation layer drives [`Simulation::tick`] and reads the fields and
//! [`Simulation::spectrum`]; rendering and file output live outside this crate.

pub mod advection;
pub mod config;
pub mod field;
pub mod laplacian;
pub mod reaction;
pub mod sim;
pub mod spectrum;

pub use advection::{advect, try_advect, AdvectionMap};
pub use config::{SimParams, SimParamsError};
pub use field::{initialize, initialize_with_rng, GridField, ShapeMismatch};
pub use laplacian::laplacian;
pub use reaction::ReactionKernel;
pub use sim::{tick, try_tick, RunPhase, RunSummary, Simulation, SimulationError, TickMetrics};
pub use spectrum::{dominant_wavenumber, spectrum, SpectrumAnalyzer};

/// Build the immutable warp table for an `n`×`n` grid.
pub fn build_advection_map(n: usize, rotation_strength: f32) -> AdvectionMap {
    AdvectionMap::build(n, rotation_strength)
}
