use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use std::{error::Error, fmt};

/// One scalar density on an N×N periodic grid, stored row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct GridField {
    size: usize,
    data: Vec<f32>,
}

/// Two arrays that must share a shape did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeMismatch {
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for ShapeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "shape mismatch: expected {0}x{0} grid, got {1}x{1}",
            self.expected, self.actual
        )
    }
}

impl Error for ShapeMismatch {}

impl GridField {
    pub fn new(size: usize, initial_value: f32) -> Self {
        Self {
            size,
            data: vec![initial_value; size * size],
        }
    }

    /// Wrap an existing row-major buffer. Panics if `data` is not `size * size` long.
    pub fn from_vec(size: usize, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            size * size,
            "buffer length must equal size * size"
        );
        Self { size, data }
    }

    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                data.push(f(row, col));
            }
        }
        Self { size, data }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.size + col] = value;
    }

    /// Toroidal lookup: any signed index wraps to the opposite edge.
    pub fn get_wrapped(&self, row: isize, col: isize) -> f32 {
        let n = self.size as isize;
        let r = row.rem_euclid(n) as usize;
        let c = col.rem_euclid(n) as usize;
        self.data[r * self.size + c]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks(self.size.max(1))
    }

    pub fn to_rows(&self) -> Vec<Vec<f32>> {
        self.rows().map(<[f32]>::to_vec).collect()
    }

    /// Sum over all cells, accumulated in f64.
    pub fn total(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.total() / self.data.len() as f64
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    pub fn non_finite_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_finite()).count()
    }

    pub fn ensure_same_shape(&self, other: &GridField) -> Result<(), ShapeMismatch> {
        if self.size != other.size {
            return Err(ShapeMismatch {
                expected: self.size,
                actual: other.size,
            });
        }
        Ok(())
    }

    /// `self += other` elementwise. Shapes must already agree.
    pub(crate) fn add_assign(&mut self, other: &GridField) {
        debug_assert_eq!(self.size, other.size);
        for (v, &d) in self.data.iter_mut().zip(&other.data) {
            *v += d;
        }
    }
}

/// Build the initial gas and radiation fields.
///
/// Gas is 1.0 outside and 0.5 inside the centered block of side `2 * seed_radius`;
/// radiation is 0.0 outside and 0.25 inside. Radiation then receives uniform noise
/// in `[0, noise_level)` at every cell, drawn from a generator seeded with
/// [`DEFAULT_NOISE_SEED`]. Panics if the seed block does not fit inside the grid.
pub fn initialize(n: usize, seed_radius: usize, noise_level: f32) -> (GridField, GridField) {
    let mut rng = ChaCha12Rng::seed_from_u64(DEFAULT_NOISE_SEED);
    initialize_with_rng(n, seed_radius, noise_level, &mut rng)
}

/// Seed used by [`initialize`]; matches the default `SimParams::seed`.
pub const DEFAULT_NOISE_SEED: u64 = 42;

/// Like [`initialize`] but draws the noise from a caller-owned generator.
pub fn initialize_with_rng<R: Rng + ?Sized>(
    n: usize,
    seed_radius: usize,
    noise_level: f32,
    rng: &mut R,
) -> (GridField, GridField) {
    assert!(
        seed_radius > 0 && 2 * seed_radius < n,
        "seed block side 2*{seed_radius} must be smaller than grid size {n}"
    );
    let mut gas = GridField::new(n, 1.0);
    let mut radiation = GridField::new(n, 0.0);

    let center = n / 2;
    let block = (center - seed_radius)..(center + seed_radius);
    for row in block.clone() {
        for col in block.clone() {
            gas.set(row, col, 0.5);
            radiation.set(row, col, 0.25);
        }
    }

    // Vacuum fluctuations: the only source of asymmetry.
    for v in radiation.data_mut() {
        *v += rng.random::<f32>() * noise_level;
    }

    (gas, radiation)
}
