use anyhow::{Result, bail};
use clap::Parser;

pub mod batch;
pub mod cli;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Résoudre la config (fichier + overrides CLI)
    let config = cli.resolve_config()?;
    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // 4. Échouer avant toute lecture de fichier si la config est invalide.
    //    Les signaux des fichiers décodés sont revalidés par fichier.
    config.validate()?;
    cli.validate_prefix()?;
    let format = cli.output_format()?;

    // 5. Extraction par lots
    let report = batch::run_batch(&cli.inputs, &config, &cli.out_dir, &cli.prefix, format)?;
    for (input, output) in &report.written {
        println!("{} -> {}", input.display(), output.display());
    }

    if !report.failed.is_empty() {
        bail!(
            "{} fichier(s) sur {} en échec",
            report.failed.len(),
            cli.inputs.len()
        );
    }
    Ok(())
}
