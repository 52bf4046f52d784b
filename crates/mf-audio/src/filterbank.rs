//! Triangular mel filter bank.
//!
//! `filter_banks + 2` points evenly spaced on the mel scale between 0 and
//! Nyquist are mapped to FFT bins; filter `i` rises from bin `p[i-1]` to its
//! peak at `p[i]` and falls back to zero at `p[i+1]`.

use mf_core::Matrix;
use mf_core::matrix::linspace;

/// Hz to mel, `2595·log10(1 + f/700)`.
#[inline]
#[must_use]
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz, `700·(10^(m/2595) − 1)`.
#[inline]
#[must_use]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Mel filter bank for one `(filter count, FFT size, sample rate)` triple.
///
/// # Example
/// ```
/// use mf_audio::filterbank::MelFilterBank;
/// let bank = MelFilterBank::new(26, 512, 16_000);
/// assert_eq!(bank.weights().rows(), 26);
/// assert_eq!(bank.weights().cols(), 257);
/// ```
#[derive(Clone, Debug)]
pub struct MelFilterBank {
    /// `filters × (fft_size / 2 + 1)` triangular weights.
    weights: Matrix,
    /// Bin index of every mel point, `filters + 2` entries.
    bin_points: Vec<usize>,
}

impl MelFilterBank {
    /// Build the filter bank.
    ///
    /// Coarse mel spacing at low frequencies can collapse neighbouring
    /// points onto one bin; the affected filters are left as all-zero rows.
    #[must_use]
    pub fn new(filters: usize, fft_size: usize, sample_rate: u32) -> Self {
        let bins = fft_size / 2 + 1;
        let sr = f64::from(sample_rate);
        let high_mel = hz_to_mel(sr / 2.0);

        let bin_points: Vec<usize> = linspace(0.0, high_mel, filters + 2)
            .into_iter()
            .map(|mel| {
                let bin = ((fft_size + 1) as f64 * mel_to_hz(mel) / sr).floor();
                (bin.max(0.0) as usize).min(bins - 1)
            })
            .collect();

        let mut weights = Matrix::zeros(filters, bins);
        for i in 1..=filters {
            let (left, center, right) = (bin_points[i - 1], bin_points[i], bin_points[i + 1]);
            let row = weights.row_mut(i - 1);
            for (j, w) in row.iter_mut().enumerate().take(center).skip(left) {
                *w = (j - left) as f64 / (center - left) as f64;
            }
            for (j, w) in row.iter_mut().enumerate().take(right).skip(center) {
                *w = (right - j) as f64 / (right - center) as f64;
            }
        }

        let bank = Self {
            weights,
            bin_points,
        };
        let degenerate = bank.degenerate_filters();
        if degenerate > 0 {
            log::warn!(
                "{degenerate}/{filters} filtres mel dégénérés (NFFT {fft_size}, {sample_rate} Hz)"
            );
        }
        bank
    }

    /// Triangular weights, one filter per row.
    #[must_use]
    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// FFT bin of every mel point (edges included).
    #[must_use]
    pub fn bin_points(&self) -> &[usize] {
        &self.bin_points
    }

    /// Number of filters whose weights are all zero.
    #[must_use]
    pub fn degenerate_filters(&self) -> usize {
        self.weights
            .iter_rows()
            .filter(|row| row.iter().all(|&w| w == 0.0))
            .count()
    }

    /// Filter-bank energies in dB: `20·log10(power × weightsᵀ)`.
    ///
    /// Exact zeros are stabilised before the logarithm so every output is finite.
    ///
    /// # Panics
    /// Panics if `power` does not have `fft_size / 2 + 1` columns.
    #[must_use]
    pub fn apply(&self, power: &Matrix) -> Matrix {
        let mut energies = power.matmul(&self.weights.transpose());
        energies.stabilize();
        for v in energies.as_mut_slice() {
            *v = 20.0 * v.log10();
        }
        energies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_scale_round_trips() {
        for hz in [0.0, 100.0, 700.0, 4000.0, 8000.0, 22_050.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6);
        }
        assert!((hz_to_mel(700.0) - 2595.0 * 2.0_f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn edge_points_cover_zero_to_nyquist() {
        let bank = MelFilterBank::new(26, 512, 16_000);
        let points = bank.bin_points();
        assert_eq!(points.len(), 28);
        assert_eq!(points[0], 0);
        assert_eq!(points[27], 256);
        assert!(points.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn filters_are_triangles_peaking_at_center() {
        let bank = MelFilterBank::new(26, 512, 16_000);
        let points = bank.bin_points();
        assert_eq!(bank.degenerate_filters(), 0);

        for i in 1..=26 {
            let row = bank.weights().row(i - 1);
            let (left, center, right) = (points[i - 1], points[i], points[i + 1]);
            assert!((row[center] - 1.0).abs() < 1e-12, "filter {i} peak");
            assert!(row[left].abs() < 1e-12, "filter {i} left edge");
            if right < row.len() {
                assert!(row[right].abs() < 1e-12, "filter {i} right edge");
            }
            for (j, &w) in row.iter().enumerate() {
                if j < left || j > right {
                    assert!(w.abs() < 1e-12, "filter {i} leaks at bin {j}");
                }
                assert!((0.0..=1.0).contains(&w));
            }
            // Rising then falling.
            for j in left..center {
                assert!(row[j] <= row[j + 1]);
            }
            for j in center..right.min(row.len() - 1) {
                assert!(row[j] >= row[j + 1]);
            }
        }
    }

    #[test]
    fn adjacent_filters_share_one_boundary_bin() {
        let bank = MelFilterBank::new(26, 512, 16_000);
        let points = bank.bin_points();
        for i in 1..26 {
            let a = bank.weights().row(i - 1);
            let b = bank.weights().row(i);
            // Filter i peaks where filter i+1 starts rising from zero.
            let boundary = points[i];
            assert!((a[boundary] - 1.0).abs() < 1e-12);
            assert!(b[boundary].abs() < 1e-12);
            // Beyond filter i's right edge, filter i is silent.
            for j in points[i + 1]..a.len() {
                assert!(a[j].abs() < 1e-12);
            }
        }
    }

    #[test]
    fn coarse_fft_yields_degenerate_rows() {
        let bank = MelFilterBank::new(40, 64, 16_000);
        assert!(bank.degenerate_filters() > 0);
        let power = Matrix::from_rows(vec![vec![1.0; 33]]);
        assert!(bank.apply(&power).is_finite());
    }

    #[test]
    fn apply_converts_to_db_and_stays_finite() {
        let bank = MelFilterBank::new(4, 16, 8000);
        let silent = Matrix::zeros(2, 9);
        let db = bank.apply(&silent);
        assert_eq!((db.rows(), db.cols()), (2, 4));
        let floor = 20.0 * f64::EPSILON.log10();
        for &v in db.as_slice() {
            assert!((v - floor).abs() < 1e-9);
        }
    }
}
