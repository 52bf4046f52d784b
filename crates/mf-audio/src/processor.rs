use mf_core::{FeatureConfig, FeatureError, FeatureKind, Matrix};

use crate::cepstral::cepstral_coefficients;
use crate::fft::{magnitude_spectra, power_spectrum};
use crate::filterbank::MelFilterBank;
use crate::framing::{apply_hamming, frame_signal};
use crate::pcm::{decode_samples, pre_emphasize, to_mono};

/// Feature extraction over a complete PCM buffer.
///
/// Holds only its configuration; every call to [`compute`](Self::compute)
/// is independent, so separate processors (or clones) can run on separate
/// threads.
///
/// # Example
/// ```
/// use mf_audio::processor::FeatureProcessor;
/// use mf_core::FeatureConfig;
///
/// let processor = FeatureProcessor::new(FeatureConfig::default());
/// let silence = vec![0u8; 32_000]; // 1 s of 16-bit mono at 16 kHz
/// let features = processor.compute(&silence).unwrap();
/// assert_eq!((features.rows(), features.cols()), (26, 98));
/// ```
#[derive(Clone, Debug, Default)]
pub struct FeatureProcessor {
    config: FeatureConfig,
}

impl FeatureProcessor {
    /// Create a processor. The configuration is validated on every run, not here.
    #[must_use]
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Replace the configuration used by later runs.
    pub fn set_config(&mut self, config: FeatureConfig) {
        self.config = config;
    }

    /// Run the full pipeline with the configured feature kind.
    ///
    /// # Errors
    /// See [`compute_features`].
    pub fn compute(&self, buffer: &[u8]) -> Result<Matrix, FeatureError> {
        compute_features(buffer, &self.config)
    }

    /// Log mel filter-bank energies, whatever the configured kind.
    ///
    /// # Errors
    /// See [`compute_features`].
    pub fn filter_banks(&self, buffer: &[u8]) -> Result<Matrix, FeatureError> {
        let config = FeatureConfig {
            kind: FeatureKind::FilterBank,
            ..self.config.clone()
        };
        compute_features(buffer, &config)
    }

    /// Cepstral coefficients, whatever the configured kind.
    ///
    /// # Errors
    /// See [`compute_features`].
    pub fn mfcc(&self, buffer: &[u8]) -> Result<Matrix, FeatureError> {
        let config = FeatureConfig {
            kind: FeatureKind::Mfcc,
            ..self.config.clone()
        };
        compute_features(buffer, &config)
    }
}

/// Turn a raw interleaved PCM buffer into a feature matrix.
///
/// The result has one row per feature (filter or cepstral coefficient) and
/// one column per frame. Each feature is mean-normalised across frames; with
/// `rescale_enabled` the whole matrix is then mapped into
/// `[scale_min, scale_max]`.
///
/// # Errors
/// - [`FeatureError::InvalidConfiguration`] if `config` fails validation.
/// - [`FeatureError::InvalidBufferSize`] if `buffer` is not a whole number of
///   interleaved frames.
///
/// Both are reported before any computation.
pub fn compute_features(buffer: &[u8], config: &FeatureConfig) -> Result<Matrix, FeatureError> {
    config.validate()?;

    let samples = decode_samples(buffer, config.bytes_per_sample, config.channels)?;
    let mut signal = to_mono(&samples, config.channels);
    pre_emphasize(&mut signal, config.pre_emphasis);
    log::debug!(
        "Signal : {} octets -> {} échantillons mono @ {} Hz",
        buffer.len(),
        signal.len(),
        config.sample_rate
    );

    let mut frames = frame_signal(
        &signal,
        config.frame_length_samples(),
        config.frame_stride_samples(),
    );
    apply_hamming(&mut frames);

    let power = power_spectrum(magnitude_spectra(&frames, config.fft_size));
    debug_assert_eq!(power.cols(), config.spectrum_bins());
    log::debug!(
        "Spectre : {} frames × {} bins (NFFT {})",
        power.rows(),
        config.spectrum_bins(),
        config.fft_size
    );
    let bank = MelFilterBank::new(config.filter_banks, config.fft_size, config.sample_rate);
    let mut features = bank.apply(&power);

    if config.kind == FeatureKind::Mfcc {
        let lifter = config.lifter_enabled.then_some(config.lifter);
        features = cepstral_coefficients(
            &features,
            config.first_coefficient,
            config.last_coefficient,
            lifter,
        );
    }

    let means = features.column_means();
    features.sub_row_vector(&means);

    let mut features = features.transpose();
    if config.rescale_enabled {
        features.rescale(config.scale_min, config.scale_max);
    }

    log::debug!(
        "Features {:?} : {} × {}",
        config.kind,
        features.rows(),
        features.cols()
    );
    Ok(features)
}
