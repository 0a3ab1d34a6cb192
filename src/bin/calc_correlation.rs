//! Correlate grammar-code frequency with perplexity for one setting.
//!
//! Appends the result `{correlation, p_value, n_samples, setting}` as one
//! line to a JSONL log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::correlation::{append_result, correlate_files};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "calc_correlation")]
#[command(about = "Calculate correlation between features and perplexity, report a significance")]
struct Cli {
    /// Input CSV with perplexity scores (setting,grammar,perplexity)
    #[arg(long)]
    ppl_file: PathBuf,

    /// Input CSV with frequency scores (grammar,frequency)
    #[arg(long)]
    freq_file: PathBuf,

    /// Setting to analyze, e.g. "1-1"
    #[arg(long)]
    section: String,

    /// JSONL log the result is appended to
    #[arg(long, default_value = "corr/corr.jsonl")]
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

    let result = correlate_files(&cli.ppl_file, &cli.freq_file, &cli.section)
        .with_context(|| format!("correlating setting {}", cli.section))?;
    info!(
        "setting {}: r = {:.4}, p = {:.4}, n = {}",
        result.setting, result.correlation, result.p_value, result.n_samples
    );

    append_result(&cli.output, &result)?;
    Ok(())
}
