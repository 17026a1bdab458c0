//! Semi-Lagrangian advection through a precomputed rotation warp.
//!
//! The warp encodes a differential rotation θ(r) = strength / r about the grid
//! center, a Keplerian-like shear without integrating gravity. It depends only on
//! geometry, so it is built once per run and shared read-only by every tick.

use crate::field::{GridField, ShapeMismatch};
use log::debug;
use rayon::prelude::*;

/// Per-cell fractional source coordinates, row-major like [`GridField`].
#[derive(Clone, Debug, PartialEq)]
pub struct AdvectionMap {
    size: usize,
    row_src: Vec<f32>,
    col_src: Vec<f32>,
}

impl AdvectionMap {
    /// Precompute the radius-dependent rotation map for an `n`×`n` grid.
    ///
    /// The exact center cell uses r = 1 in place of r = 0. Its displacement is
    /// zero, so it maps onto itself regardless of θ.
    pub fn build(n: usize, rotation_strength: f32) -> Self {
        let center = (n / 2) as f64;
        let strength = rotation_strength as f64;
        let mut row_src = Vec::with_capacity(n * n);
        let mut col_src = Vec::with_capacity(n * n);

        for i in 0..n {
            for j in 0..n {
                let dx = j as f64 - center;
                let dy = i as f64 - center;
                let mut r = (dx * dx + dy * dy).sqrt();
                if r == 0.0 {
                    r = 1.0;
                }
                let theta = strength / r;
                let (sin_t, cos_t) = theta.sin_cos();

                let x_warp = dx * cos_t - dy * sin_t + center;
                let y_warp = dx * sin_t + dy * cos_t + center;
                row_src.push(y_warp as f32);
                col_src.push(x_warp as f32);
            }
        }

        debug!("built {n}x{n} advection map, rotation_strength={rotation_strength}");
        Self {
            size: n,
            row_src,
            col_src,
        }
    }

    /// Wrap caller-supplied source coordinates. Panics if either table is not `size * size` long.
    pub fn from_coords(size: usize, row_src: Vec<f32>, col_src: Vec<f32>) -> Self {
        assert_eq!(row_src.len(), size * size, "row_src must be size * size");
        assert_eq!(col_src.len(), size * size, "col_src must be size * size");
        Self {
            size,
            row_src,
            col_src,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Source `(row, col)` sampled to produce destination cell `(row, col)`.
    pub fn source(&self, row: usize, col: usize) -> (f32, f32) {
        let idx = row * self.size + col;
        (self.row_src[idx], self.col_src[idx])
    }

    pub fn row_src(&self) -> &[f32] {
        &self.row_src
    }

    pub fn col_src(&self) -> &[f32] {
        &self.col_src
    }

    pub fn ensure_matches(&self, field: &GridField) -> Result<(), ShapeMismatch> {
        if field.size() != self.size {
            return Err(ShapeMismatch {
                expected: self.size,
                actual: field.size(),
            });
        }
        Ok(())
    }
}

/// Bilinear sample of `z` at a fractional `(row, col)`, wrapping past every edge.
pub fn sample_bilinear_wrapped(z: &GridField, row: f32, col: f32) -> f32 {
    let n = z.size() as isize;
    let (row, col) = (row as f64, col as f64);
    let r0f = row.floor();
    let c0f = col.floor();
    let fr = row - r0f;
    let fc = col - c0f;

    let r0 = (r0f as isize).rem_euclid(n);
    let c0 = (c0f as isize).rem_euclid(n);
    let r1 = (r0 + 1) % n;
    let c1 = (c0 + 1) % n;

    let at = |r: isize, c: isize| z.get(r as usize, c as usize) as f64;
    let top = (1.0 - fc) * at(r0, c0) + fc * at(r0, c1);
    let bottom = (1.0 - fc) * at(r1, c0) + fc * at(r1, c1);
    ((1.0 - fr) * top + fr * bottom) as f32
}

/// Resample `z` through `map`. Mildly diffusive; conserves nothing exactly.
pub fn try_advect(z: &GridField, map: &AdvectionMap) -> Result<GridField, ShapeMismatch> {
    map.ensure_matches(z)?;
    let n = z.size();
    let mut out = GridField::new(n, 0.0);
    if n == 0 {
        return Ok(out);
    }
    out.data_mut()
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(row, out_row)| {
            let base = row * n;
            for (col, cell) in out_row.iter_mut().enumerate() {
                *cell = sample_bilinear_wrapped(z, map.row_src[base + col], map.col_src[base + col]);
            }
        });
    Ok(out)
}

pub fn advect(z: &GridField, map: &AdvectionMap) -> GridField {
    try_advect(z, map).unwrap_or_else(|e| panic!("{e}"))
}
