//! Collect per-setting evaluation perplexities into a CSV.
//!
//! Walks a results root whose subdirectories are settings (`1-1`, ...,
//! `base`) holding `<grammar>.<div>.test.txt` files.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::sweep::{collect_results, write_results, ModelFamily};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "extract_sweep")]
#[command(about = "Collect evaluation perplexities from a settings tree into a CSV")]
struct Cli {
    /// Results root, e.g. lstm-results or transformer-results
    #[arg(short, long)]
    input: PathBuf,

    /// Location to save the output CSV
    #[arg(short = 'O', long)]
    output_folder: PathBuf,

    /// Which family's setting list to walk
    #[arg(long, value_enum)]
    family: ModelFamily,

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

    let records = collect_results(&cli.input, cli.family)
        .with_context(|| format!("collecting results under {}", cli.input.display()))?;

    fs::create_dir_all(&cli.output_folder)?;
    let csv_path = cli.output_folder.join("perplexity_scores.csv");
    write_results(&csv_path, &records)?;
    info!("wrote {} perplexity scores to {}", records.len(), csv_path.display());
    Ok(())
}
