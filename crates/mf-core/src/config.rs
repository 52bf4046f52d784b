use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Largest accepted FFT length. Bounds the recursion depth of the transform to 16.
pub const MAX_FFT_SIZE: usize = 1 << 16;

/// Largest accepted frame length in samples (about 65 s at 16 kHz).
pub const MAX_FRAME_SAMPLES: usize = 1 << 20;

/// Largest accepted number of mel filters.
pub const MAX_FILTER_BANKS: usize = 1024;

/// Kind of feature matrix produced by the pipeline.
///
/// # Example
/// ```
/// use mf_core::config::FeatureKind;
/// assert_eq!(FeatureKind::default(), FeatureKind::FilterBank);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum FeatureKind {
    /// Log mel filter-bank energies (MSFB).
    #[default]
    FilterBank,
    /// Mel-frequency cepstral coefficients.
    Mfcc,
}

/// Complete configuration of one feature extraction.
///
/// Immutable for the duration of a run and validated once before any stage
/// executes. Every field has a sane default matching 16 kHz speech analysis.
///
/// # Example
/// ```
/// use mf_core::config::FeatureConfig;
/// let config = FeatureConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.frame_length_samples(), 400);
/// assert_eq!(config.frame_stride_samples(), 160);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FeatureConfig {
    // === Signal ===
    /// Bytes per PCM sample: 1 (unsigned 8-bit) or 2 (signed 16-bit LE).
    pub bytes_per_sample: u16,
    /// Interleaved channel count of the raw buffer.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Pre-emphasis coefficient [0.0, 1.0]. 0 = filter disabled.
    pub pre_emphasis: f64,

    // === Framing ===
    /// Frame length in milliseconds.
    pub frame_size_ms: f64,
    /// Distance between consecutive frame starts in milliseconds.
    pub frame_stride_ms: f64,
    /// FFT length (power of two). Frames are padded or truncated to it.
    pub fft_size: usize,

    // === Features ===
    /// Number of triangular mel filters.
    pub filter_banks: usize,
    /// Filter-bank energies or cepstral coefficients.
    pub kind: FeatureKind,
    /// First retained cepstral coefficient (1-based, inclusive).
    pub first_coefficient: usize,
    /// Last retained cepstral coefficient (1-based, inclusive).
    pub last_coefficient: usize,
    /// Apply the sinusoidal lifter to cepstral coefficients.
    pub lifter_enabled: bool,
    /// Lifter parameter `L`.
    pub lifter: f64,
    /// Rescale the final matrix into `[scale_min, scale_max]`.
    pub rescale_enabled: bool,
    /// Lower bound of the rescaled range.
    pub scale_min: f64,
    /// Upper bound of the rescaled range.
    pub scale_max: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            bytes_per_sample: 2,
            channels: 1,
            sample_rate: 16_000,
            pre_emphasis: 0.97,
            frame_size_ms: 25.0,
            frame_stride_ms: 10.0,
            fft_size: 512,
            filter_banks: 26,
            kind: FeatureKind::FilterBank,
            first_coefficient: 2,
            last_coefficient: 13,
            lifter_enabled: true,
            lifter: 22.0,
            rescale_enabled: false,
            scale_min: 0.0,
            scale_max: 1.0,
        }
    }
}

impl FeatureConfig {
    /// Frame length converted to samples, `round(ms / 1000 × sample_rate)`.
    #[must_use]
    pub fn frame_length_samples(&self) -> usize {
        ms_to_samples(self.frame_size_ms, self.sample_rate)
    }

    /// Frame stride converted to samples, `round(ms / 1000 × sample_rate)`.
    #[must_use]
    pub fn frame_stride_samples(&self) -> usize {
        ms_to_samples(self.frame_stride_ms, self.sample_rate)
    }

    /// Number of non-redundant spectrum bins, `fft_size / 2 + 1`.
    #[must_use]
    pub fn spectrum_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Bytes occupied by one interleaved frame of the raw buffer.
    #[must_use]
    pub fn frame_bytes(&self) -> usize {
        usize::from(self.bytes_per_sample) * usize::from(self.channels)
    }

    /// Check every field and report the first violated constraint.
    ///
    /// # Errors
    /// Returns [`FeatureError::InvalidConfiguration`] naming the offending field.
    ///
    /// # Example
    /// ```
    /// use mf_core::config::FeatureConfig;
    /// let config = FeatureConfig { bytes_per_sample: 3, ..FeatureConfig::default() };
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), FeatureError> {
        if !matches!(self.bytes_per_sample, 1 | 2) {
            return Err(FeatureError::config(format!(
                "bytes_per_sample must be 1 or 2 (got {})",
                self.bytes_per_sample
            )));
        }
        if self.channels == 0 {
            return Err(FeatureError::config("channels must be > 0"));
        }
        if self.sample_rate == 0 {
            return Err(FeatureError::config("sample_rate must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.pre_emphasis) {
            return Err(FeatureError::config(format!(
                "pre_emphasis must lie in [0, 1] (got {})",
                self.pre_emphasis
            )));
        }
        check_positive("frame_size_ms", self.frame_size_ms)?;
        check_positive("frame_stride_ms", self.frame_stride_ms)?;
        if self.frame_length_samples() == 0 {
            return Err(FeatureError::config(format!(
                "frame_size_ms {} is shorter than one sample at {} Hz",
                self.frame_size_ms, self.sample_rate
            )));
        }
        if self.frame_length_samples() > MAX_FRAME_SAMPLES {
            return Err(FeatureError::config(format!(
                "frame_size_ms {} exceeds {MAX_FRAME_SAMPLES} samples at {} Hz",
                self.frame_size_ms, self.sample_rate
            )));
        }
        if self.frame_stride_samples() == 0 {
            return Err(FeatureError::config(format!(
                "frame_stride_ms {} is shorter than one sample at {} Hz",
                self.frame_stride_ms, self.sample_rate
            )));
        }
        if self.fft_size == 0 {
            return Err(FeatureError::config("fft_size must be > 0"));
        }
        if !self.fft_size.is_power_of_two() {
            return Err(FeatureError::config(format!(
                "fft_size must be a power of two (got {})",
                self.fft_size
            )));
        }
        if self.fft_size > MAX_FFT_SIZE {
            return Err(FeatureError::config(format!(
                "fft_size must not exceed {MAX_FFT_SIZE} (got {})",
                self.fft_size
            )));
        }
        if self.filter_banks == 0 {
            return Err(FeatureError::config("filter_banks must be > 0"));
        }
        if self.filter_banks > MAX_FILTER_BANKS {
            return Err(FeatureError::config(format!(
                "filter_banks must not exceed {MAX_FILTER_BANKS} (got {})",
                self.filter_banks
            )));
        }
        if self.filter_banks > self.spectrum_bins() {
            return Err(FeatureError::config(format!(
                "filter_banks ({}) exceeds the {} spectrum bins of fft_size {}",
                self.filter_banks,
                self.spectrum_bins(),
                self.fft_size
            )));
        }

        if self.kind == FeatureKind::Mfcc {
            if self.first_coefficient == 0 {
                return Err(FeatureError::config("first_coefficient must be > 0"));
            }
            if self.first_coefficient > self.last_coefficient {
                return Err(FeatureError::config(format!(
                    "first_coefficient ({}) exceeds last_coefficient ({})",
                    self.first_coefficient, self.last_coefficient
                )));
            }
            if self.last_coefficient > self.filter_banks {
                return Err(FeatureError::config(format!(
                    "last_coefficient ({}) exceeds filter_banks ({})",
                    self.last_coefficient, self.filter_banks
                )));
            }
            if self.lifter_enabled {
                check_positive("lifter", self.lifter)?;
            }
        }

        if self.rescale_enabled
            && !(self.scale_min.is_finite()
                && self.scale_max.is_finite()
                && self.scale_min < self.scale_max)
        {
            return Err(FeatureError::config(format!(
                "rescale range [{}, {}] must be finite and increasing",
                self.scale_min, self.scale_max
            )));
        }

        Ok(())
    }

    /// Serialise into the sectioned TOML layout read by [`load_config`].
    ///
    /// # Errors
    /// Returns an error if TOML serialisation fails.
    pub fn to_toml(&self) -> Result<String> {
        let file = ConfigFile {
            signal: Some(SignalSection {
                bytes_per_sample: Some(self.bytes_per_sample),
                channels: Some(self.channels),
                sample_rate: Some(self.sample_rate),
                pre_emphasis: Some(self.pre_emphasis),
            }),
            framing: Some(FramingSection {
                frame_size_ms: Some(self.frame_size_ms),
                frame_stride_ms: Some(self.frame_stride_ms),
                fft_size: Some(self.fft_size),
            }),
            features: Some(FeaturesSection {
                kind: Some(self.kind),
                filter_banks: Some(self.filter_banks),
                first_coefficient: Some(self.first_coefficient),
                last_coefficient: Some(self.last_coefficient),
                lifter_enabled: Some(self.lifter_enabled),
                lifter: Some(self.lifter),
                rescale_enabled: Some(self.rescale_enabled),
                scale_min: Some(self.scale_min),
                scale_max: Some(self.scale_max),
            }),
        };
        toml::to_string_pretty(&file).context("Erreur de sérialisation TOML")
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), FeatureError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FeatureError::config(format!(
            "{field} must be > 0 (got {value})"
        )))
    }
}

fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    let samples = (ms / 1000.0 * f64::from(sample_rate)).round();
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Default, Deserialize, Serialize)]
struct ConfigFile {
    signal: Option<SignalSection>,
    framing: Option<FramingSection>,
    features: Option<FeaturesSection>,
}

/// `[signal]` section, all fields optional for partial override.
#[derive(Deserialize, Serialize)]
struct SignalSection {
    bytes_per_sample: Option<u16>,
    channels: Option<u16>,
    sample_rate: Option<u32>,
    pre_emphasis: Option<f64>,
}

/// `[framing]` section.
#[derive(Deserialize, Serialize)]
struct FramingSection {
    frame_size_ms: Option<f64>,
    frame_stride_ms: Option<f64>,
    fft_size: Option<usize>,
}

/// `[features]` section.
#[derive(Deserialize, Serialize)]
struct FeaturesSection {
    kind: Option<FeatureKind>,
    filter_banks: Option<usize>,
    first_coefficient: Option<usize>,
    last_coefficient: Option<usize>,
    lifter_enabled: Option<bool>,
    lifter: Option<f64>,
    rescale_enabled: Option<bool>,
    scale_min: Option<f64>,
    scale_max: Option<f64>,
}

/// Load a TOML file and merge it over the defaults.
///
/// The result is not validated here; the pipeline validates before each run.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use mf_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<FeatureConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse sectioned TOML text on top of [`FeatureConfig::default`].
///
/// # Errors
/// Returns an error if the text is not valid TOML for this layout.
///
/// # Example
/// ```
/// use mf_core::config::{parse_config, FeatureKind};
/// let config = parse_config("[features]\nkind = \"Mfcc\"\n").unwrap();
/// assert_eq!(config.kind, FeatureKind::Mfcc);
/// assert_eq!(config.fft_size, 512);
/// ```
pub fn parse_config(content: &str) -> Result<FeatureConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = FeatureConfig::default();

    if let Some(s) = file.signal {
        if let Some(v) = s.bytes_per_sample {
            config.bytes_per_sample = v;
        }
        if let Some(v) = s.channels {
            config.channels = v;
        }
        if let Some(v) = s.sample_rate {
            config.sample_rate = v;
        }
        if let Some(v) = s.pre_emphasis {
            config.pre_emphasis = v;
        }
    }

    if let Some(f) = file.framing {
        if let Some(v) = f.frame_size_ms {
            config.frame_size_ms = v;
        }
        if let Some(v) = f.frame_stride_ms {
            config.frame_stride_ms = v;
        }
        if let Some(v) = f.fft_size {
            config.fft_size = v;
        }
    }

    if let Some(f) = file.features {
        if let Some(v) = f.kind {
            config.kind = v;
        }
        if let Some(v) = f.filter_banks {
            config.filter_banks = v;
        }
        if let Some(v) = f.first_coefficient {
            config.first_coefficient = v;
        }
        if let Some(v) = f.last_coefficient {
            config.last_coefficient = v;
        }
        if let Some(v) = f.lifter_enabled {
            config.lifter_enabled = v;
        }
        if let Some(v) = f.lifter {
            config.lifter = v;
        }
        if let Some(v) = f.rescale_enabled {
            config.rescale_enabled = v;
        }
        if let Some(v) = f.scale_min {
            config.scale_min = v;
        }
        if let Some(v) = f.scale_max {
            config.scale_max = v;
        }
    }

    log::debug!("Configuration chargée : {config:?}");
    Ok(config)
}
