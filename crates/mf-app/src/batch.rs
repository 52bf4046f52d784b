use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mf_audio::FeatureProcessor;
use mf_audio::decode::decode_file;
use mf_core::FeatureConfig;
use mf_export::{OutputFormat, next_sequence_number, output_path, write_matrix};
use rayon::prelude::*;

/// Extensions read as headerless PCM laid out as the configuration describes.
const RAW_EXTENSIONS: &[&str] = &["pcm", "raw"];

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(input, output)` pairs successfully written.
    pub written: Vec<(PathBuf, PathBuf)>,
    /// `(input, error)` pairs that failed.
    pub failed: Vec<(PathBuf, String)>,
}

/// Extract features from every input, in parallel, one output file each.
///
/// Sequence numbers are reserved up front from a scan of `out_dir`, so the
/// output name of input `i` is `<prefix>_<base + i>` regardless of which
/// worker finishes first. Each worker owns its own configuration copy.
///
/// # Errors
/// Returns an error if `out_dir` cannot be created or scanned. Per-input
/// failures are collected in [`BatchReport::failed`] instead.
pub fn run_batch(
    inputs: &[PathBuf],
    config: &FeatureConfig,
    out_dir: &Path,
    prefix: &str,
    format: OutputFormat,
) -> Result<BatchReport> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Impossible de créer {}", out_dir.display()))?;
    let base = next_sequence_number(out_dir, prefix)?;
    log::info!(
        "Extraction de {} fichier(s) vers {} (à partir de {prefix}_{base})",
        inputs.len(),
        out_dir.display()
    );

    let results: Vec<(PathBuf, Result<PathBuf>)> = inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| {
            let output = output_path(out_dir, prefix, base + i as u64, format);
            let result = process_one(input, config, &output, format).map(|()| output);
            (input.clone(), result)
        })
        .collect();

    let mut report = BatchReport::default();
    for (input, result) in results {
        match result {
            Ok(output) => report.written.push((input, output)),
            Err(e) => {
                log::error!("{} : {e:#}", input.display());
                report.failed.push((input, format!("{e:#}")));
            }
        }
    }
    Ok(report)
}

/// Load, extract, and write a single input.
fn process_one(
    input: &Path,
    base: &FeatureConfig,
    output: &Path,
    format: OutputFormat,
) -> Result<()> {
    let (bytes, config) = load_input(input, base)?;
    let features = FeatureProcessor::new(config)
        .compute(&bytes)
        .with_context(|| format!("Extraction impossible pour {}", input.display()))?;
    write_matrix(output, &features, format)
}

/// Raw buffers keep `base` as-is; decoded files override the signal fields.
fn load_input(input: &Path, base: &FeatureConfig) -> Result<(Vec<u8>, FeatureConfig)> {
    let is_raw = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| RAW_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));

    if is_raw {
        let bytes = std::fs::read(input)
            .with_context(|| format!("Impossible de lire {}", input.display()))?;
        Ok((bytes, base.clone()))
    } else {
        let clip = decode_file(input)?;
        let config = clip.apply_to(base);
        Ok((clip.bytes, config))
    }
}
