//! Scatter-plot the aggregated training-run perplexities per grammar.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::extract::RunRecord;
use gramplex::visualize::plot_runs;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "visualize_ppl")]
#[command(about = "Visualize the aggregated perplexity scores")]
struct Cli {
    /// Aggregated run CSV (output of extract_ppl)
    #[arg(short, long)]
    input_file: PathBuf,

    /// Output SVG path
    #[arg(short, long, default_value = "perplexity_plot.svg")]
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

    let mut reader = csv::Reader::from_reader(
        File::open(&cli.input_file)
            .with_context(|| format!("opening {}", cli.input_file.display()))?,
    );
    let records: Vec<RunRecord> = reader.deserialize().collect::<csv::Result<_>>()?;

    plot_runs(&records, &cli.output)
}
