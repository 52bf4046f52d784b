use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use mf_core::Matrix;

/// On-disk encoding of a feature matrix.
///
/// # Example
/// ```
/// use mf_export::OutputFormat;
/// let format: OutputFormat = "bin".parse().unwrap();
/// assert_eq!(format, OutputFormat::Binary);
/// assert_eq!(format.extension(), "bin");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One row per line, values separated by spaces.
    #[default]
    Text,
    /// bincode encoding of the [`Matrix`] (shape + row-major data).
    Binary,
    /// JSON object `{ "rows", "cols", "data" }`.
    Json,
}

impl OutputFormat {
    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Binary => "bin",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "binary" | "bin" => Ok(Self::Binary),
            "json" => Ok(Self::Json),
            other => bail!("Format de sortie inconnu : '{other}' (text, binary, json)"),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Json => "json",
        })
    }
}

/// Write `matrix` to `path` in `format`, replacing any existing file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_matrix(path: &Path, matrix: &Matrix, format: OutputFormat) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Impossible de créer {}", path.display()))?;
    let mut out = BufWriter::new(file);

    match format {
        OutputFormat::Text => write_text(&mut out, matrix)?,
        OutputFormat::Binary => bincode::serialize_into(&mut out, matrix)
            .with_context(|| format!("Erreur d'encodage binaire vers {}", path.display()))?,
        OutputFormat::Json => serde_json::to_writer(&mut out, matrix)
            .with_context(|| format!("Erreur d'encodage JSON vers {}", path.display()))?,
    }
    out.flush()
        .with_context(|| format!("Erreur d'écriture dans {}", path.display()))?;

    log::info!(
        "Écrit {} ({}×{}, {format})",
        path.display(),
        matrix.rows(),
        matrix.cols()
    );
    Ok(())
}

/// Plain-text layout: one matrix row per line, space-separated values.
///
/// # Errors
/// Returns an error if the writer fails.
///
/// # Example
/// ```
/// use mf_core::Matrix;
/// use mf_export::writer::write_text;
/// let mut out = Vec::new();
/// write_text(&mut out, &Matrix::from_rows(vec![vec![1.0, -0.5], vec![2.0, 0.25]])).unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "1 -0.5\n2 0.25\n");
/// ```
pub fn write_text<W: Write>(out: &mut W, matrix: &Matrix) -> Result<()> {
    for row in matrix.iter_rows() {
        let mut first = true;
        for v in row {
            if !first {
                out.write_all(b" ")?;
            }
            write!(out, "{v}")?;
            first = false;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Load a matrix written with [`OutputFormat::Binary`].
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn read_binary(path: &Path) -> Result<Matrix> {
    let file =
        File::open(path).with_context(|| format!("Impossible d'ouvrir {}", path.display()))?;
    bincode::deserialize_from(BufReader::new(file))
        .with_context(|| format!("Erreur de décodage binaire dans {}", path.display()))
}
