use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Immutable parameter record for one simulation run.
///
/// Defaults reproduce the labyrinth regime of the Stoner–Turing toy model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Side length N of the periodic grid.
    pub grid_size: usize,
    /// Explicit Euler time step (dimensionless).
    pub dt: f32,
    /// Gas (activator) diffusion coefficient.
    pub diff_gas: f32,
    /// Radiation (inhibitor) diffusion coefficient.
    pub diff_radiation: f32,
    /// Accretion rate replenishing gas toward 1.
    pub feed: f32,
    /// Decay rate removing radiation (on top of `feed`).
    pub kill: f32,
    /// Nonlinear coupling strength.
    pub eta: f32,
    /// Angular rotation at unit radius; falls off as 1/r.
    pub rotation_strength: f32,
    /// Reaction sub-steps per visual tick.
    pub steps_per_frame: usize,
    /// Ticks after which the run is complete.
    pub num_frames: usize,
    pub with_advection: bool,
    /// Half-side of the central seed block.
    pub seed_radius: usize,
    /// Upper bound of the uniform noise added to radiation at start.
    pub noise_level: f32,
    /// RNG seed for the initial noise.
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            grid_size: 200,
            dt: 1.0,
            diff_gas: 0.16,
            diff_radiation: 0.08,
            feed: 0.040,
            kill: 0.060,
            eta: 1.0,
            rotation_strength: 0.05,
            steps_per_frame: 8,
            num_frames: 256,
            with_advection: true,
            seed_radius: 10,
            noise_level: 0.05,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimParamsError {
    EmptyGrid,
    GridTooLarge { max: usize, actual: usize },
    SeedTooLarge { seed_radius: usize, grid_size: usize },
    NoSubSteps,
    NoFrames,
    NonFinite { name: &'static str },
    Negative { name: &'static str, value: f32 },
}

impl fmt::Display for SimParamsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimParamsError::EmptyGrid => write!(f, "grid_size must be positive"),
            SimParamsError::GridTooLarge { max, actual } => {
                write!(f, "grid_size ({actual}) exceeds supported maximum ({max})")
            }
            SimParamsError::SeedTooLarge {
                seed_radius,
                grid_size,
            } => write!(
                f,
                "seed block side 2*{seed_radius} must be smaller than grid_size ({grid_size})"
            ),
            SimParamsError::NoSubSteps => write!(f, "steps_per_frame must be positive"),
            SimParamsError::NoFrames => write!(f, "num_frames must be positive"),
            SimParamsError::NonFinite { name } => write!(f, "{name} must be finite"),
            SimParamsError::Negative { name, value } => {
                write!(f, "{name} must be non-negative, got {value}")
            }
        }
    }
}

impl Error for SimParamsError {}

impl SimParams {
    pub const MAX_GRID_SIZE: usize = 4096;

    /// Checks caller preconditions. Never adjusts values: an unstable but
    /// well-formed parameter choice is accepted.
    pub fn validate(&self) -> Result<(), SimParamsError> {
        if self.grid_size == 0 {
            return Err(SimParamsError::EmptyGrid);
        }
        if self.grid_size > Self::MAX_GRID_SIZE {
            return Err(SimParamsError::GridTooLarge {
                max: Self::MAX_GRID_SIZE,
                actual: self.grid_size,
            });
        }
        if self.seed_radius == 0 || 2 * self.seed_radius >= self.grid_size {
            return Err(SimParamsError::SeedTooLarge {
                seed_radius: self.seed_radius,
                grid_size: self.grid_size,
            });
        }
        if self.steps_per_frame == 0 {
            return Err(SimParamsError::NoSubSteps);
        }
        if self.num_frames == 0 {
            return Err(SimParamsError::NoFrames);
        }

        let non_negative = [
            ("dt", self.dt),
            ("diff_gas", self.diff_gas),
            ("diff_radiation", self.diff_radiation),
            ("feed", self.feed),
            ("kill", self.kill),
            ("eta", self.eta),
            ("noise_level", self.noise_level),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() {
                return Err(SimParamsError::NonFinite { name });
            }
            if value < 0.0 {
                return Err(SimParamsError::Negative { name, value });
            }
        }
        // Sign selects the spin direction, so only finiteness is checked.
        if !self.rotation_strength.is_finite() {
            return Err(SimParamsError::NonFinite {
                name: "rotation_strength",
            });
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(SimParams::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_seed_block_covering_grid() {
        let params = SimParams {
            grid_size: 20,
            seed_radius: 10,
            ..SimParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(SimParamsError::SeedTooLarge {
                seed_radius: 10,
                grid_size: 20
            })
        );
    }

    #[test]
    fn rejects_zero_sub_steps_and_bad_scalars() {
        let no_steps = SimParams {
            steps_per_frame: 0,
            ..SimParams::default()
        };
        assert_eq!(no_steps.validate(), Err(SimParamsError::NoSubSteps));

        let nan_feed = SimParams {
            feed: f32::NAN,
            ..SimParams::default()
        };
        assert_eq!(
            nan_feed.validate(),
            Err(SimParamsError::NonFinite { name: "feed" })
        );

        let negative_kill = SimParams {
            kill: -0.1,
            ..SimParams::default()
        };
        assert!(matches!(
            negative_kill.validate(),
            Err(SimParamsError::Negative { name: "kill", .. })
        ));
    }

    #[test]
    fn negative_rotation_is_accepted() {
        let params = SimParams {
            rotation_strength: -0.05,
            ..SimParams::default()
        };
        assert_eq!(params.validate(), Ok(()));
    }

    #[test]
    fn json_fills_missing_fields_from_defaults() {
        let params = SimParams::from_json(r#"{"grid_size": 64, "with_advection": false}"#)
            .expect("valid json");
        assert_eq!(params.grid_size, 64);
        assert!(!params.with_advection);
        assert_eq!(params.feed, SimParams::default().feed);

        let text = params.to_json().expect("serializable");
        assert_eq!(SimParams::from_json(&text).expect("round trip"), params);
    }
}
