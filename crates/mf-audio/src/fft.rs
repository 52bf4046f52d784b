use std::f64::consts::PI;

use mf_core::Matrix;
use realfft::num_complex::Complex64;

/// Recursive radix-2 decimation-in-time FFT, in place.
///
/// The length must be a power of two; lengths 0 and 1 are returned unchanged.
/// Recursion depth is `log2(len)`.
///
/// # Example
/// ```
/// use mf_audio::fft::fft;
/// use realfft::num_complex::Complex64;
/// let mut buf = vec![Complex64::new(1.0, 0.0); 4];
/// fft(&mut buf);
/// assert!((buf[0].re - 4.0).abs() < 1e-12);
/// assert!(buf[1].norm() < 1e-12);
/// ```
pub fn fft(buf: &mut [Complex64]) {
    let n = buf.len();
    if n <= 1 {
        return;
    }
    debug_assert!(n.is_power_of_two(), "FFT length must be a power of two");

    let mut even: Vec<Complex64> = buf.iter().step_by(2).copied().collect();
    let mut odd: Vec<Complex64> = buf.iter().skip(1).step_by(2).copied().collect();
    fft(&mut even);
    fft(&mut odd);

    let half = n / 2;
    for k in 0..half {
        let t = Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64) * odd[k];
        buf[k] = even[k] + t;
        buf[k + half] = even[k] - t;
    }
}

/// Magnitude of the non-redundant half of a real frame's spectrum.
///
/// The frame is zero-padded or truncated to `fft_size` samples first.
/// Returns `fft_size / 2 + 1` bins.
///
/// # Example
/// ```
/// use mf_audio::fft::magnitude_spectrum;
/// let spectrum = magnitude_spectrum(&[1.0], 8);
/// assert_eq!(spectrum.len(), 5);
/// assert!(spectrum.iter().all(|m| (m - 1.0).abs() < 1e-12));
/// ```
#[must_use]
pub fn magnitude_spectrum(frame: &[f64], fft_size: usize) -> Vec<f64> {
    let mut buf: Vec<Complex64> = frame
        .iter()
        .take(fft_size)
        .map(|&x| Complex64::new(x, 0.0))
        .collect();
    buf.resize(fft_size, Complex64::new(0.0, 0.0));

    fft(&mut buf);

    buf.iter()
        .take(fft_size / 2 + 1)
        .map(|c| (c.re * c.re + c.im * c.im).sqrt())
        .collect()
}

/// Magnitude spectrum of every frame (row) of `frames`.
#[must_use]
pub fn magnitude_spectra(frames: &Matrix, fft_size: usize) -> Matrix {
    let bins = fft_size / 2 + 1;
    let mut data = Vec::with_capacity(frames.rows() * bins);
    for frame in frames.iter_rows() {
        data.extend(magnitude_spectrum(frame, fft_size));
    }
    Matrix::from_vec(frames.rows(), bins, data)
}

/// Power spectrum: `magnitude² / bins`, where `bins` is the row length.
#[must_use]
pub fn power_spectrum(mut magnitudes: Matrix) -> Matrix {
    let bins = magnitudes.cols() as f64;
    for v in magnitudes.as_mut_slice() {
        *v = *v * *v / bins;
    }
    magnitudes
}

#[cfg(test)]
mod tests {
    use super::*;
    use realfft::RealFftPlanner;

    fn test_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                (0.3 * t).sin() + 0.5 * (1.7 * t).cos() + ((i * 7919) % 13) as f64 / 13.0
            })
            .collect()
    }

    #[test]
    fn impulse_has_flat_spectrum() {
        for size in [2, 16, 512] {
            let spectrum = magnitude_spectrum(&[1.0], size);
            assert_eq!(spectrum.len(), size / 2 + 1);
            for m in spectrum {
                assert!((m - 1.0).abs() < 1e-9, "size {size}: {m}");
            }
        }
    }

    #[test]
    fn sinusoid_peaks_at_expected_bin() {
        let sample_rate = 16_000.0;
        let fft_size = 512;
        for freq in [250.0, 1000.0, 3125.0, 6000.0] {
            let frame: Vec<f64> = (0..fft_size)
                .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
                .collect();
            let spectrum = magnitude_spectrum(&frame, fft_size);
            let peak = spectrum
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i);
            let expected = (freq * fft_size as f64 / sample_rate).round() as usize;
            assert_eq!(peak, Some(expected), "freq {freq}");
        }
    }

    #[test]
    fn matches_realfft_reference() {
        let n = 256;
        let signal = test_signal(n);
        let ours = magnitude_spectrum(&signal, n);

        let mut planner = RealFftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(n);
        let mut input = signal.clone();
        let mut output = plan.make_output_vec();
        assert!(plan.process(&mut input, &mut output).is_ok());

        assert_eq!(ours.len(), output.len());
        for (a, b) in ours.iter().zip(&output) {
            assert!((a - b.norm()).abs() < 1e-9, "{a} vs {}", b.norm());
        }
    }

    #[test]
    fn energy_is_conserved() {
        let n = 128;
        let signal = test_signal(n);
        let mut buf: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        fft(&mut buf);

        let time: f64 = signal.iter().map(|x| x * x).sum();
        let freq: f64 = buf.iter().map(Complex64::norm_sqr).sum::<f64>() / n as f64;
        assert!((time - freq).abs() < 1e-9 * time.max(1.0));
    }

    #[test]
    fn inverse_relation_recovers_signal() {
        // ifft(x) = conj(fft(conj(x))) / n
        let n = 64;
        let signal = test_signal(n);
        let mut buf: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        fft(&mut buf);
        for c in &mut buf {
            *c = c.conj();
        }
        fft(&mut buf);
        for (c, &x) in buf.iter().zip(&signal) {
            let back = c.conj() / n as f64;
            assert!((back.re - x).abs() < 1e-9);
            assert!(back.im.abs() < 1e-9);
        }
    }

    #[test]
    fn frames_are_truncated_to_fft_size() {
        let long = test_signal(40);
        assert_eq!(magnitude_spectrum(&long, 32), magnitude_spectrum(&long[..32], 32));
    }

    #[test]
    fn power_divides_by_bin_count() {
        let m = Matrix::from_rows(vec![vec![2.0, 4.0], vec![0.0, 1.0]]);
        let p = power_spectrum(m);
        assert_eq!(p.as_slice(), &[2.0, 8.0, 0.0, 0.5]);
    }

    #[test]
    fn spectra_keep_row_count() {
        let frames = Matrix::from_rows(vec![test_signal(20), test_signal(20), test_signal(20)]);
        let spectra = magnitude_spectra(&frames, 32);
        assert_eq!((spectra.rows(), spectra.cols()), (3, 17));
    }
}
