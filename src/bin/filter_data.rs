//! Copy the balanced subset of training data: 5 factors x 6 permutations
//! per formation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gramplex::filter::filter_data;
use gramplex::grammar::Formation;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "filter_data")]
#[command(about = "Filter out the minimal balanced portion of the training data")]
struct Cli {
    /// Root of the unfiltered data tree
    #[arg(long, default_value = "data-train-adjust")]
    input_dir: PathBuf,

    /// Root of the filtered output tree
    #[arg(long, default_value = "data-train-adjust-filtered")]
    output_dir: PathBuf,

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

    for formation in Formation::ALL {
        let input = cli.input_dir.join(formation.as_str()).join("sent_permuted");
        let output = cli.output_dir.join(formation.as_str()).join("sent_permuted");
        info!("filtering data from {} to {}", input.display(), output.display());
        filter_data(&input, &output)
            .with_context(|| format!("filtering formation {formation}"))?;
    }
    Ok(())
}
