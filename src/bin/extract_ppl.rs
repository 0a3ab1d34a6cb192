//! Extract perplexity scores from fairseq logs and aggregate into a CSV.
//!
//! Usage:
//!   cargo run --bin extract_ppl -- --input logs/ --output-folder vis/ --set train

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::extract::{scan_directory, write_records, ExtractMode};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "extract_ppl")]
#[command(about = "Extract perplexity scores from fairseq logs into a CSV")]
struct Cli {
    /// Folder containing the log files
    #[arg(short, long)]
    input: PathBuf,

    /// Location to save the output CSV
    #[arg(short = 'O', long)]
    output_folder: PathBuf,

    /// Which kind of logs the folder holds
    #[arg(long, value_enum, default_value = "train")]
    set: ExtractMode,

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

    let outcome = scan_directory(&cli.input, cli.set)
        .with_context(|| format!("scanning {}", cli.input.display()))?;
    outcome.report_failures();

    fs::create_dir_all(&cli.output_folder)?;
    let csv_path = cli.output_folder.join("aggregated_ppl.csv");
    write_records(&csv_path, &outcome.records)?;
    info!(
        "wrote {} records ({} skipped) to {}",
        outcome.records.len(),
        outcome.failures.len(),
        csv_path.display()
    );
    Ok(())
}
