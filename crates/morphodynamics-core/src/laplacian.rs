//! 5-point (von Neumann) Laplacian on a periodic grid.

use crate::field::GridField;
use rayon::prelude::*;

/// `L[i,j] = Z[i-1,j] + Z[i+1,j] + Z[i,j-1] + Z[i,j+1] - 4 Z[i,j]`, indices mod N.
pub fn laplacian(z: &GridField) -> GridField {
    let mut out = GridField::new(z.size(), 0.0);
    laplacian_into(z, &mut out);
    out
}

/// Writes the Laplacian of `z` into `out`. Every output cell reads only `z`, so
/// the result never observes a partially written field.
pub fn laplacian_into(z: &GridField, out: &mut GridField) {
    let n = z.size();
    assert_eq!(out.size(), n, "laplacian output must match input shape");
    if n == 0 {
        return;
    }
    let src = z.data();

    out.data_mut()
        .par_chunks_mut(n)
        .enumerate()
        .for_each(|(row, out_row)| {
            let up = ((row + n - 1) % n) * n;
            let down = ((row + 1) % n) * n;
            let here = row * n;
            for (col, cell) in out_row.iter_mut().enumerate() {
                let left = (col + n - 1) % n;
                let right = (col + 1) % n;
                *cell = src[up + col] + src[down + col] + src[here + left] + src[here + right]
                    - 4.0 * src[here + col];
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn constant_field_has_zero_laplacian() {
        let lap = laplacian(&GridField::new(9, 3.5));
        assert!(lap.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn column_zero_wraps_to_last_column() {
        let n = 8;
        let mut z = GridField::new(n, 0.0);
        z.set(3, n - 1, 1.0);
        let lap = laplacian(&z);
        assert_eq!(lap.get(3, 0), 1.0, "left neighbour of column 0 is column N-1");
        assert_eq!(lap.get(3, n - 2), 1.0);
        assert_eq!(lap.get(3, n - 1), -4.0);
        assert_eq!(lap.get(2, n - 1), 1.0);
        assert_eq!(lap.get(4, n - 1), 1.0);
        assert_eq!(lap.get(3, 1), 0.0);
    }

    #[test]
    fn row_zero_wraps_to_last_row() {
        let n = 5;
        let mut z = GridField::new(n, 0.0);
        z.set(n - 1, 2, 2.0);
        let lap = laplacian(&z);
        assert_eq!(lap.get(0, 2), 2.0);
    }

    #[test]
    fn sums_to_zero_on_torus() {
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let z = GridField::from_fn(64, |_, _| rng.random::<f32>());
        let total = laplacian(&z).total();
        assert!(total.abs() < 1e-3, "sum of laplacian was {total}");
    }

    #[test]
    fn matches_wrapped_definition() {
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        let z = GridField::from_fn(7, |_, _| rng.random::<f32>());
        let lap = laplacian(&z);
        for i in 0..7isize {
            for j in 0..7isize {
                let expected = z.get_wrapped(i - 1, j)
                    + z.get_wrapped(i + 1, j)
                    + z.get_wrapped(i, j - 1)
                    + z.get_wrapped(i, j + 1)
                    - 4.0 * z.get_wrapped(i, j);
                let got = lap.get(i as usize, j as usize);
                assert!((got - expected).abs() < 1e-6);
            }
        }
    }
}
