//! Income Model Training - Entry Point

use clap::Parser;
use inference_engine::{train, ParamGrid, TrainingConfig, DEFAULT_MODEL_PATH};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Train the income classifier on the census dataset
#[derive(Debug, Parser)]
#[command(name = "train-model", version, about)]
struct Args {
    /// Census CSV with a header row and an `income` column
    #[arg(long, default_value = "adult.csv")]
    dataset: PathBuf,

    /// Output path of the trained model
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Seed for the train/test split and the forests
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Cross-validation folds
    #[arg(long, default_value_t = 3)]
    folds: usize,

    /// Search a reduced parameter grid
    #[arg(long)]
    quick: bool,

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

    let config = TrainingConfig {
        dataset_path: args.dataset,
        model_path: args.model_path,
        test_size: args.test_size,
        seed: args.seed,
        folds: args.folds,
        grid: if args.quick {
            ParamGrid::quick()
        } else {
            ParamGrid::default()
        },
    };

    let report = train(&config)?;

    info!("Best parameters: {}", report.best_params);
    info!("Cross-validation accuracy: {:.4}", report.cv_score);
    info!("Test accuracy: {:.4}", report.test_accuracy);
    println!("\nClassification Report:\n{}", report.classification);
    info!("Model training completed successfully, saved to {}", config.model_path.display());
    Ok(())
}
