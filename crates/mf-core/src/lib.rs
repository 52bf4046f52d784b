/// Configuration, error type, and numeric matrix primitives for melfeat.
///
/// This crate holds the types shared by the extraction pipeline, the
/// exporters, and the command-line front end.

pub mod config;
pub mod error;
pub mod matrix;

pub use config::{FeatureConfig, FeatureKind};
pub use error::FeatureError;
pub use matrix::Matrix;
