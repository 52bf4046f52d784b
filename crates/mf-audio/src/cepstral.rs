//! Cepstral post-processing of filter-bank energies.
//!
//! Orthonormal DCT-II over each row, selection of an inclusive 1-based
//! coefficient range, optional sinusoidal liftering.

use std::f64::consts::PI;

use mf_core::Matrix;

/// Orthonormal DCT-II: `X[k] = s(k)·Σ x[n]·cos(π·k·(2n+1) / 2N)`,
/// with `s(0) = √(1/N)` and `s(k) = √(2/N)` otherwise.
///
/// # Example
/// ```
/// use mf_audio::cepstral::dct_ii;
/// let out = dct_ii(&[1.0, 1.0, 1.0, 1.0]);
/// assert!((out[0] - 2.0).abs() < 1e-12);
/// assert!(out[1..].iter().all(|c| c.abs() < 1e-12));
/// ```
#[must_use]
pub fn dct_ii(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return Vec::new();
    }
    let nf = n as f64;
    (0..n)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * nf)).cos())
                .sum();
            let norm = if k == 0 { (1.0 / nf).sqrt() } else { (2.0 / nf).sqrt() };
            sum * norm
        })
        .collect()
}

/// Lifter weights `1 + (L/2)·sin(π·k/L)` for `k` in `0..count`.
#[must_use]
pub fn lifter_weights(count: usize, lifter: f64) -> Vec<f64> {
    (0..count)
        .map(|k| 1.0 + (lifter / 2.0) * (PI * k as f64 / lifter).sin())
        .collect()
}

/// Cepstral coefficients `first..=last` (1-based) of every filter-bank row.
///
/// Coefficient `k` is DCT output `k − 1`. With `lifter = Some(L)` the
/// retained coefficients are weighted by [`lifter_weights`], indexed by
/// their position in the retained range.
///
/// # Panics
/// Panics unless `1 <= first <= last <= fbank.cols()`.
///
/// # Example
/// ```
/// use mf_audio::cepstral::cepstral_coefficients;
/// use mf_core::Matrix;
/// let fbank = Matrix::from_rows(vec![vec![1.0; 8]]);
/// let mfcc = cepstral_coefficients(&fbank, 2, 5, None);
/// assert_eq!(mfcc.cols(), 4);
/// ```
#[must_use]
pub fn cepstral_coefficients(
    fbank: &Matrix,
    first: usize,
    last: usize,
    lifter: Option<f64>,
) -> Matrix {
    assert!(
        first >= 1 && first <= last && last <= fbank.cols(),
        "coefficient range {first}..={last} outside 1..={}",
        fbank.cols()
    );
    let count = last - first + 1;
    let weights = lifter.map(|l| lifter_weights(count, l));

    let mut data = Vec::with_capacity(fbank.rows() * count);
    for row in fbank.iter_rows() {
        let coeffs = dct_ii(row);
        let kept = &coeffs[first - 1..last];
        match &weights {
            Some(w) => data.extend(kept.iter().zip(w).map(|(c, w)| c * w)),
            None => data.extend_from_slice(kept),
        }
    }
    Matrix::from_vec(fbank.rows(), count, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dct_is_orthonormal() {
        let input = [3.0, -1.0, 4.0, 1.0, -5.0, 9.0, 2.0, -6.0];
        let out = dct_ii(&input);
        let e_in: f64 = input.iter().map(|x| x * x).sum();
        let e_out: f64 = out.iter().map(|x| x * x).sum();
        assert!((e_in - e_out).abs() < 1e-9);
    }

    #[test]
    fn dct_of_cosine_concentrates_in_one_bin() {
        let n = 16;
        let k0 = 3;
        let input: Vec<f64> = (0..n)
            .map(|i| (PI * k0 as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n as f64)).cos())
            .collect();
        let out = dct_ii(&input);
        for (k, c) in out.iter().enumerate() {
            if k == k0 {
                assert!(c.abs() > 1.0);
            } else {
                assert!(c.abs() < 1e-9, "bin {k}: {c}");
            }
        }
    }

    #[test]
    fn lifter_starts_at_one_and_peaks_mid_range() {
        let w = lifter_weights(23, 22.0);
        assert!((w[0] - 1.0).abs() < 1e-12);
        assert!((w[11] - 12.0).abs() < 1e-12);
        assert!((w[22] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn selects_inclusive_one_based_range() {
        let row: Vec<f64> = (0..10).map(|i| f64::from(i).sin()).collect();
        let full = dct_ii(&row);
        let fbank = Matrix::from_rows(vec![row.clone(), row]);

        let picked = cepstral_coefficients(&fbank, 2, 4, None);
        assert_eq!((picked.rows(), picked.cols()), (2, 3));
        assert_eq!(picked.row(1), &full[1..4]);

        let all = cepstral_coefficients(&fbank, 1, 10, None);
        assert_eq!(all.row(0), full.as_slice());
    }

    #[test]
    fn lifter_weights_retained_positions() {
        let row: Vec<f64> = (0..6).map(|i| f64::from(i) + 1.0).collect();
        let full = dct_ii(&row);
        let fbank = Matrix::from_rows(vec![row]);
        let lifted = cepstral_coefficients(&fbank, 2, 4, Some(4.0));
        let w = lifter_weights(3, 4.0);
        for k in 0..3 {
            assert!((lifted.get(0, k) - full[k + 1] * w[k]).abs() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn range_past_filter_count_panics() {
        let fbank = Matrix::zeros(1, 4);
        let _ = cepstral_coefficients(&fbank, 1, 5, None);
    }
}
