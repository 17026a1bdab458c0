//! Log-magnitude power spectrum of a field, zero frequency at the center.
//!
//! Diagnostic only: nothing here feeds back into the integration.

use crate::field::{GridField, ShapeMismatch};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Added to every magnitude before the log so empty bins stay finite.
pub const LOG_EPSILON: f64 = 1e-9;

/// Holds the FFT plan for one grid size; `analyze` never mutates its input.
#[derive(Clone)]
pub struct SpectrumAnalyzer {
    size: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("size", &self.size)
            .finish()
    }
}

impl SpectrumAnalyzer {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            size,
            fft: planner.plan_fft_forward(size),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn analyze(&self, z: &GridField) -> Result<GridField, ShapeMismatch> {
        if z.size() != self.size {
            return Err(ShapeMismatch {
                expected: self.size,
                actual: z.size(),
            });
        }
        let n = self.size;
        if n == 0 {
            return Ok(GridField::new(0, 0.0));
        }

        let mut data: Vec<Complex<f64>> = z
            .data()
            .iter()
            .map(|&v| Complex::new(v as f64, 0.0))
            .collect();

        // Rows: the buffer is n consecutive rows of length n.
        self.fft.process(&mut data);
        // Columns: transpose, transform as rows, transpose back.
        transpose_square(&mut data, n);
        self.fft.process(&mut data);
        transpose_square(&mut data, n);

        fft_shift(&mut data, n);

        let magnitude = data
            .iter()
            .map(|c| (c.norm() + LOG_EPSILON).ln() as f32)
            .collect();
        Ok(GridField::from_vec(n, magnitude))
    }
}

/// One-shot spectrum; plans a fresh FFT for `z`'s size.
pub fn spectrum(z: &GridField) -> GridField {
    SpectrumAnalyzer::new(z.size())
        .analyze(z)
        .unwrap_or_else(|e| panic!("{e}"))
}

fn transpose_square<T: Copy>(data: &mut [T], n: usize) {
    for row in 0..n {
        for col in (row + 1)..n {
            data.swap(row * n + col, col * n + row);
        }
    }
}

/// Move frequency index `k` to `(k + n/2) % n` on both axes, so zero frequency
/// lands at `(n/2, n/2)` for even and odd `n` alike.
pub fn fft_shift<T: Copy>(data: &mut [T], n: usize) {
    assert_eq!(data.len(), n * n, "fft_shift expects a square buffer");
    let half = n / 2;
    let src = data.to_vec();
    for row in 0..n {
        let dst_row = (row + half) % n;
        for col in 0..n {
            let dst_col = (col + half) % n;
            data[dst_row * n + dst_col] = src[row * n + col];
        }
    }
}

/// Radial distance, in frequency-index units, from the center to the strongest
/// non-DC bin of a shifted spectrum. Approximates `n / wavelength` of the
/// dominant pattern.
pub fn dominant_wavenumber(spectrum: &GridField) -> f32 {
    let n = spectrum.size();
    if n < 2 {
        return 0.0;
    }
    let center = n / 2;
    let mut best = f32::NEG_INFINITY;
    let mut best_at = (center, center);
    for row in 0..n {
        for col in 0..n {
            if row == center && col == center {
                continue;
            }
            let v = spectrum.get(row, col);
            if v > best {
                best = v;
                best_at = (row, col);
            }
        }
    }
    let dr = best_at.0 as f32 - center as f32;
    let dc = best_at.1 as f32 - center as f32;
    (dr * dr + dc * dc).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::f32::consts::PI;

    #[test]
    fn constant_field_peaks_at_center() {
        let s = spectrum(&GridField::new(8, 2.0));
        let dc = s.get(4, 4);
        assert!((dc - (128.0f64 + LOG_EPSILON).ln() as f32).abs() < 1e-4);
        let floor = LOG_EPSILON.ln() as f32;
        for row in 0..8 {
            for col in 0..8 {
                if (row, col) != (4, 4) {
                    assert!(s.get(row, col) < floor + 1.0, "bin ({row}, {col})");
                }
            }
        }
    }

    #[test]
    fn real_input_is_point_symmetric() {
        let n = 16;
        let mut rng = ChaCha12Rng::seed_from_u64(21);
        let z = GridField::from_fn(n, |_, _| rng.random::<f32>());
        let s = spectrum(&z);
        // Row and column 0 hold the Nyquist bins, which reflect onto themselves.
        for row in 0..n {
            for col in 0..n {
                let a = s.get(row, col);
                let b = s.get((n - row) % n, (n - col) % n);
                assert!((a - b).abs() < 1e-4, "({row}, {col}): {a} vs {b}");
            }
        }
    }

    #[test]
    fn odd_size_input_is_point_symmetric() {
        let n = 15;
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        let z = GridField::from_fn(n, |_, _| rng.random::<f32>());
        let s = spectrum(&z);
        for row in 0..n {
            for col in 0..n {
                let a = s.get(row, col);
                let b = s.get(n - 1 - row, n - 1 - col);
                assert!((a - b).abs() < 1e-4, "({row}, {col}): {a} vs {b}");
            }
        }
    }

    #[test]
    fn odd_sizes_center_zero_frequency() {
        let s = spectrum(&GridField::new(7, 1.0));
        let center = s.get(3, 3);
        assert!(s.data().iter().all(|&v| v <= center));
        assert!((center - 49.0f32.ln()).abs() < 1e-4);
    }

    #[test]
    fn plane_wave_dominant_wavenumber() {
        let n = 32;
        let z = GridField::from_fn(n, |_, col| (2.0 * PI * 3.0 * col as f32 / n as f32).cos());
        let k = dominant_wavenumber(&spectrum(&z));
        assert!((k - 3.0).abs() < 1e-6);
    }

    #[test]
    fn analyze_does_not_mutate_and_checks_shape() {
        let z = GridField::from_fn(10, |row, col| (row * col) as f32);
        let before = z.clone();
        let analyzer = SpectrumAnalyzer::new(10);
        let _ = analyzer.analyze(&z).expect("matching size");
        assert_eq!(z, before);
        assert!(analyzer.analyze(&GridField::new(9, 0.0)).is_err());
    }

    #[test]
    fn shift_moves_origin_to_center() {
        let mut buf: Vec<u32> = (0..9).collect();
        fft_shift(&mut buf, 3);
        // Index 0 moves to (1, 1).
        assert_eq!(buf[4], 0);
        assert_eq!(buf, vec![8, 6, 7, 2, 0, 1, 5, 3, 4]);
    }
}
