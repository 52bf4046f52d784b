//! Raw PCM conditioning: byte decoding, channel mixdown, and pre-emphasis.

use mf_core::FeatureError;

/// Decode little-endian interleaved PCM bytes into one value per sample.
///
/// 1-byte samples are unsigned (0..=255), 2-byte samples are signed 16-bit.
/// Channels are not mixed here; see [`to_mono`].
///
/// # Errors
/// - [`FeatureError::InvalidConfiguration`] if `bytes_per_sample` is not 1 or 2
///   or `channels` is zero.
/// - [`FeatureError::InvalidBufferSize`] if the buffer length is not a multiple
///   of `bytes_per_sample × channels`.
///
/// # Example
/// ```
/// use mf_audio::pcm::decode_samples;
/// let samples = decode_samples(&[0x01, 0x00, 0xFF, 0xFF], 2, 1).unwrap();
/// assert_eq!(samples, vec![1.0, -1.0]);
/// ```
pub fn decode_samples(
    buffer: &[u8],
    bytes_per_sample: u16,
    channels: u16,
) -> Result<Vec<f64>, FeatureError> {
    if !matches!(bytes_per_sample, 1 | 2) || channels == 0 {
        return Err(FeatureError::InvalidConfiguration(format!(
            "cannot decode {bytes_per_sample}-byte samples over {channels} channels"
        )));
    }
    let frame_bytes = usize::from(bytes_per_sample) * usize::from(channels);
    if buffer.len() % frame_bytes != 0 {
        return Err(FeatureError::InvalidBufferSize {
            len: buffer.len(),
            frame_bytes,
        });
    }

    let samples = if bytes_per_sample == 1 {
        buffer.iter().map(|&b| f64::from(b)).collect()
    } else {
        buffer
            .chunks_exact(2)
            .map(|c| f64::from(i16::from_le_bytes([c[0], c[1]])))
            .collect()
    };
    Ok(samples)
}

/// Encode samples back into little-endian PCM bytes.
///
/// Values are rounded and clamped into the sample type's range
/// (`u8` for one byte, `i16` for two).
///
/// # Errors
/// Returns [`FeatureError::InvalidConfiguration`] if `bytes_per_sample` is not 1 or 2.
///
/// # Example
/// ```
/// use mf_audio::pcm::encode_samples;
/// assert_eq!(encode_samples(&[1.0, -1.0], 2).unwrap(), vec![0x01, 0x00, 0xFF, 0xFF]);
/// ```
pub fn encode_samples(samples: &[f64], bytes_per_sample: u16) -> Result<Vec<u8>, FeatureError> {
    match bytes_per_sample {
        1 => Ok(samples
            .iter()
            .map(|&s| s.round().clamp(0.0, f64::from(u8::MAX)) as u8)
            .collect()),
        2 => Ok(samples
            .iter()
            .flat_map(|&s| {
                let v = s.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
                v.to_le_bytes()
            })
            .collect()),
        other => Err(FeatureError::InvalidConfiguration(format!(
            "cannot encode {other}-byte samples"
        ))),
    }
}

/// Average every group of `channels` interleaved samples into one mono sample.
///
/// A trailing partial group is dropped; decoded buffers never have one.
///
/// # Panics
/// Panics if `channels` is zero.
///
/// # Example
/// ```
/// use mf_audio::pcm::to_mono;
/// assert_eq!(to_mono(&[1.0, 3.0, -2.0, 2.0], 2), vec![2.0, 0.0]);
/// ```
#[must_use]
pub fn to_mono(samples: &[f64], channels: u16) -> Vec<f64> {
    let channels = usize::from(channels);
    assert!(channels > 0, "channel count must be > 0");
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|chunk| chunk.iter().sum::<f64>() / channels as f64)
        .collect()
}

/// First-order high-pass filter: `y[i] = x[i] − coeff·x[i−1]`, `y[0] = x[0]`.
///
/// Runs back to front so each output reads the unfiltered previous input.
///
/// # Example
/// ```
/// use mf_audio::pcm::pre_emphasize;
/// let mut s = vec![1.0, 1.0, 1.0];
/// pre_emphasize(&mut s, 0.5);
/// assert_eq!(s, vec![1.0, 0.5, 0.5]);
/// ```
pub fn pre_emphasize(samples: &mut [f64], coeff: f64) {
    for i in (1..samples.len()).rev() {
        samples[i] -= coeff * samples[i - 1];
    }
}
