use thiserror::Error;

/// Errors originating from the feature-extraction core.
///
/// Both kinds abort the pipeline before any stage runs; no partial matrix
/// is ever produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    /// A configuration field is zero, out of range, or inconsistent.
    #[error("Configuration invalide : {0}")]
    InvalidConfiguration(String),

    /// The raw buffer does not hold a whole number of interleaved frames.
    #[error("Taille de buffer invalide : {len} octets, non multiple de {frame_bytes}")]
    InvalidBufferSize {
        /// Length of the rejected buffer in bytes.
        len: usize,
        /// Bytes per interleaved frame (bytes per sample × channels).
        frame_bytes: usize,
    },
}

impl FeatureError {
    /// Shorthand for [`FeatureError::InvalidConfiguration`].
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
