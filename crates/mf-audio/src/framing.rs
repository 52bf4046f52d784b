//! Frame segmentation and Hamming windowing.

use mf_core::Matrix;

/// Number of frames produced for `sample_count` samples.
///
/// `ceil((sample_count − length) / stride)` for signals longer than one
/// frame; a signal that fits in a single frame (including an empty one)
/// yields exactly one zero-padded frame.
///
/// # Panics
/// Panics if `stride` is zero.
///
/// # Example
/// ```
/// use mf_audio::framing::frame_count;
/// assert_eq!(frame_count(16_000, 400, 160), 98);
/// assert_eq!(frame_count(100, 400, 160), 1);
/// ```
#[must_use]
pub fn frame_count(sample_count: usize, length: usize, stride: usize) -> usize {
    assert!(stride > 0, "frame stride must be > 0");
    if sample_count <= length {
        1
    } else {
        (sample_count - length).div_ceil(stride)
    }
}

/// Slice `samples` into overlapping frames of `length` samples, `stride` apart.
///
/// Every frame is fully populated; only a signal shorter than one frame is
/// zero-padded at the tail.
///
/// # Panics
/// Panics if `length` or `stride` is zero.
///
/// # Example
/// ```
/// use mf_audio::framing::frame_signal;
/// let frames = frame_signal(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
/// assert_eq!(frames.to_rows(), vec![vec![1.0, 2.0, 3.0], vec![3.0, 4.0, 5.0]]);
/// ```
#[must_use]
pub fn frame_signal(samples: &[f64], length: usize, stride: usize) -> Matrix {
    assert!(length > 0, "frame length must be > 0");
    let count = frame_count(samples.len(), length, stride);

    let mut frames = Matrix::zeros(count, length);
    for i in 0..count {
        let start = i * stride;
        if start >= samples.len() {
            break;
        }
        let end = (start + length).min(samples.len());
        frames.row_mut(i)[..end - start].copy_from_slice(&samples[start..end]);
    }

    log::debug!(
        "Framing : {} échantillons -> {count} frames de {length} (pas {stride})",
        samples.len()
    );
    frames
}

/// Hamming coefficients `0.54 − 0.46·cos(2π·j / (L−1))` for a frame of `length`.
///
/// A one-sample window is `[1.0]`.
#[must_use]
pub fn hamming(length: usize) -> Vec<f64> {
    if length == 1 {
        return vec![1.0];
    }
    let denom = (length - 1) as f64;
    (0..length)
        .map(|j| 0.54 - 0.46 * (2.0 * std::f64::consts::PI * j as f64 / denom).cos())
        .collect()
}

/// Multiply every frame (row) by a Hamming window of the frame length.
pub fn apply_hamming(frames: &mut Matrix) {
    let window = hamming(frames.cols());
    for i in 0..frames.rows() {
        for (x, w) in frames.row_mut(i).iter_mut().zip(&window) {
            *x *= w;
        }
    }
}
