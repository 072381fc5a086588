//! Census Visualizations - Entry Point

use clap::Parser;
use census_data::load_dataset;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use visualize::{generate_all, load_font, DEFAULT_OUTPUT_DIR};

/// Render the analysis page charts from the census dataset
#[derive(Debug, Parser)]
#[command(name = "generate-visualizations", version, about)]
struct Args {
    /// Census CSV with a header row and an `income` column
    #[arg(long, default_value = "adult.csv")]
    dataset: PathBuf,

    /// Directory the PNG files are written to
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// TrueType font for labels; common system fonts are tried otherwise
    #[arg(long)]
    font: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Generating visualizations for the analysis page...");
    let dataset = load_dataset(&args.dataset)?;
    info!("Dataset loaded with {} records", dataset.len());

    let font = load_font(args.font.as_deref())?;
    let written = generate_all(&dataset, &args.output, font.as_ref())?;

    info!(
        "All {} visualizations written to {}",
        written.len(),
        args.output.display()
    );
    Ok(())
}
