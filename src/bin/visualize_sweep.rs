//! Per-settings-group scatter plots of evaluation perplexities.
//!
//! Each settings group (`1-*`, `2-*`, ...) renders to its own SVG, with the
//! `base` setting overlaid for reference.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::sweep::SweepRecord;
use gramplex::visualize::plot_sweep;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "visualize_sweep")]
#[command(about = "Visualize evaluation perplexities per settings group")]
struct Cli {
    /// Sweep CSV (output of extract_sweep)
    #[arg(short, long)]
    input_file: PathBuf,

    /// Directory for the per-group SVGs
    #[arg(short = 'O', long, default_value = "vis")]
    output_folder: PathBuf,

    /// Label used in captions and filenames, e.g. "lstm"
    #[arg(long, default_value = "transformer")]
    model_name: String,

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

    let mut reader = csv::Reader::from_reader(
        File::open(&cli.input_file)
            .with_context(|| format!("opening {}", cli.input_file.display()))?,
    );
    let records: Vec<SweepRecord> = reader.deserialize().collect::<csv::Result<_>>()?;

    plot_sweep(&records, &cli.output_folder, &cli.model_name)
}
