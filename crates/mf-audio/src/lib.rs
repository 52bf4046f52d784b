// PCM conditioning, spectral analysis, and mel feature extraction for melfeat.

pub mod cepstral;
pub mod decode;
pub mod fft;
pub mod filterbank;
pub mod framing;
pub mod pcm;
pub mod processor;

pub use processor::{FeatureProcessor, compute_features};
