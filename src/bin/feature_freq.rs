//! Compute grammar-code frequencies from a typological feature database.
//!
//! Reads the `codes.csv`/`values.csv` pair and writes one frequency per
//! possible 6-digit grammar code.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::typology::{write_frequency_table, TypologyDb};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "feature_freq")]
#[command(about = "Compute grammar-code frequencies from a typological database")]
struct Cli {
    /// Directory holding codes.csv and values.csv
    #[arg(short, long, default_value = "corr/wals")]
    input_dir: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "corr/frequency.csv")]
    output: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = TypologyDb::load(&cli.input_dir)
        .with_context(|| format!("loading typological database from {}", cli.input_dir.display()))?;
    info!("database covers {} languages", db.n_languages());

    let table = db.frequency_table();
    write_frequency_table(&cli.output, &table)?;
    info!("wrote {} frequencies to {}", table.len(), cli.output.display());
    Ok(())
}
