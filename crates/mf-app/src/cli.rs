use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use mf_core::config::{FeatureConfig, FeatureKind, load_config};
use mf_export::OutputFormat;

/// melfeat : extraction de bancs de filtres mel / MFCC pour corpus audio.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichiers audio (WAV, FLAC, MP3, OGG) ou buffers PCM bruts (.pcm, .raw).
    #[arg(required_unless_present = "dump_config")]
    pub inputs: Vec<PathBuf>,

    /// Fichier de configuration TOML. Défaut : valeurs intégrées.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Produire des MFCC au lieu des énergies de banc de filtres.
    #[arg(long, default_value_t = false)]
    pub mfcc: bool,

    /// Taille de FFT (puissance de deux).
    #[arg(long)]
    pub nfft: Option<usize>,

    /// Nombre de filtres mel.
    #[arg(long)]
    pub filters: Option<usize>,

    /// Longueur de frame en millisecondes.
    #[arg(long)]
    pub frame_ms: Option<f64>,

    /// Pas entre frames en millisecondes.
    #[arg(long)]
    pub stride_ms: Option<f64>,

    /// Coefficient de pré-accentuation [0, 1].
    #[arg(long)]
    pub pre_emphasis: Option<f64>,

    /// Remettre la matrice à l'échelle dans [MIN, MAX].
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    pub rescale: Option<Vec<f64>>,

    /// Format de sortie : text, binary, json.
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Dossier de sortie.
    #[arg(short, long, default_value = "features")]
    pub out_dir: PathBuf,

    /// Préfixe des fichiers de sortie (`<prefix>_<n>.<ext>`).
    #[arg(long, default_value = "features")]
    pub prefix: String,

    /// Afficher la configuration résolue en TOML et quitter.
    #[arg(long, default_value_t = false)]
    pub dump_config: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Load `--config` (or the defaults) and apply the per-field overrides.
    ///
    /// # Errors
    /// Returns an error if the configuration file cannot be read or parsed.
    pub fn resolve_config(&self) -> Result<FeatureConfig> {
        let mut config = match self.config.as_deref() {
            Some(path) => load_config(path)?,
            None => FeatureConfig::default(),
        };

        if self.mfcc {
            config.kind = FeatureKind::Mfcc;
        }
        if let Some(v) = self.nfft {
            config.fft_size = v;
        }
        if let Some(v) = self.filters {
            config.filter_banks = v;
        }
        if let Some(v) = self.frame_ms {
            config.frame_size_ms = v;
        }
        if let Some(v) = self.stride_ms {
            config.frame_stride_ms = v;
        }
        if let Some(v) = self.pre_emphasis {
            config.pre_emphasis = v;
        }
        if let Some([min, max]) = self.rescale.as_deref() {
            config.rescale_enabled = true;
            config.scale_min = *min;
            config.scale_max = *max;
        }
        Ok(config)
    }

    /// Parsed `--format`.
    ///
    /// # Errors
    /// Returns an error for an unknown format name.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.format.parse()
    }

    /// Reject an empty prefix or one containing a path separator.
    ///
    /// # Errors
    /// Returns an error if the prefix cannot name a file inside `--out-dir`.
    pub fn validate_prefix(&self) -> Result<()> {
        if self.prefix.is_empty() || self.prefix.contains(['/', '\\']) {
            bail!("Préfixe de sortie invalide : '{}'", self.prefix);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli> {
        Ok(Cli::try_parse_from(std::iter::once("melfeat").chain(args.iter().copied()))?)
    }

    #[test]
    fn defaults_leave_config_untouched() -> Result<()> {
        let cli = parse(&["a.wav"])?;
        assert_eq!(cli.resolve_config()?, FeatureConfig::default());
        assert_eq!(cli.output_format()?, OutputFormat::Text);
        assert_eq!(cli.inputs, vec![PathBuf::from("a.wav")]);
        Ok(())
    }

    #[test]
    fn overrides_apply() -> Result<()> {
        let cli = parse(&[
            "--mfcc",
            "--nfft",
            "1024",
            "--filters",
            "40",
            "--frame-ms",
            "32",
            "--stride-ms",
            "16",
            "--pre-emphasis",
            "0.5",
            "--rescale",
            "-1",
            "1",
            "--format",
            "json",
            "a.wav",
            "b.raw",
        ])?;
        let config = cli.resolve_config()?;
        assert_eq!(config.kind, FeatureKind::Mfcc);
        assert_eq!(config.fft_size, 1024);
        assert_eq!(config.filter_banks, 40);
        assert!((config.frame_size_ms - 32.0).abs() < f64::EPSILON);
        assert!((config.frame_stride_ms - 16.0).abs() < f64::EPSILON);
        assert!((config.pre_emphasis - 0.5).abs() < f64::EPSILON);
        assert!(config.rescale_enabled);
        assert!((config.scale_min + 1.0).abs() < f64::EPSILON);
        assert!((config.scale_max - 1.0).abs() < f64::EPSILON);
        assert_eq!(cli.output_format()?, OutputFormat::Json);
        assert_eq!(cli.inputs.len(), 2);
        Ok(())
    }

    #[test]
    fn inputs_required_unless_dumping_config() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--dump-config"]).is_ok());
    }

    #[test]
    fn prefix_must_be_a_plain_name() -> Result<()> {
        assert!(parse(&["--prefix", "../x", "a.wav"])?.validate_prefix().is_err());
        assert!(parse(&["--prefix", "speech", "a.wav"])?.validate_prefix().is_ok());
        Ok(())
    }
}
