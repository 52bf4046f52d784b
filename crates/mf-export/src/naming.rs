//! Sequence-numbered output names, `<prefix>_<n>.<ext>`.
//!
//! The next number comes from scanning the target directory, so runs never
//! overwrite earlier outputs and no counter outlives a call.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::writer::OutputFormat;

/// One past the highest `n` among files named `<prefix>_<n>.<any ext>` in `dir`.
///
/// Returns 0 for a missing or empty directory.
///
/// # Errors
/// Returns an error if `dir` exists but cannot be listed.
pub fn next_sequence_number(dir: &Path, prefix: &str) -> Result<u64> {
    if !dir.exists() {
        return Ok(0);
    }
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("Impossible de lister {}", dir.display()))?;

    let next = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|e| e.path().file_stem()?.to_str().map(String::from))
        .filter_map(|stem| parse_sequence(&stem, prefix))
        .max()
        .map_or(0, |n| n + 1);
    Ok(next)
}

/// `dir/<prefix>_<seq>.<ext>`.
///
/// # Example
/// ```
/// use mf_export::{OutputFormat, output_path};
/// use std::path::Path;
/// let path = output_path(Path::new("out"), "speech", 7, OutputFormat::Json);
/// assert_eq!(path, Path::new("out/speech_7.json"));
/// ```
#[must_use]
pub fn output_path(dir: &Path, prefix: &str, seq: u64, format: OutputFormat) -> PathBuf {
    dir.join(format!("{prefix}_{seq}.{}", format.extension()))
}

fn parse_sequence(stem: &str, prefix: &str) -> Option<u64> {
    stem.strip_prefix(prefix)?.strip_prefix('_')?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_matching_stems() {
        assert_eq!(parse_sequence("clip_12", "clip"), Some(12));
        assert_eq!(parse_sequence("clip_x", "clip"), None);
        assert_eq!(parse_sequence("clip12", "clip"), None);
        assert_eq!(parse_sequence("other_3", "clip"), None);
    }

    #[test]
    fn missing_directory_starts_at_zero() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert_eq!(next_sequence_number(&dir.path().join("absent"), "clip")?, 0);
        assert_eq!(next_sequence_number(dir.path(), "clip")?, 0);
        Ok(())
    }

    #[test]
    fn continues_after_highest_existing_number() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["clip_0.txt", "clip_4.bin", "clip_2.json", "noise_9.txt", "clip_notes.txt"] {
            std::fs::write(dir.path().join(name), b"")?;
        }
        assert_eq!(next_sequence_number(dir.path(), "clip")?, 5);
        assert_eq!(next_sequence_number(dir.path(), "noise")?, 10);
        Ok(())
    }
}
