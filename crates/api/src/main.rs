//! Income Prediction Server - Main Entry Point

use api::{init_logging, run_server, ServerConfig, DEFAULT_CONFIG_PATH};
use clap::Parser;
use inference_engine::{train, TrainingConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use tracing::{info, warn};

/// Serve the income prediction form and JSON endpoint
#[derive(Debug, Parser)]
#[command(name = "income-server", version, about)]
struct Args {
    /// Configuration file; missing files are ignored
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Train a model from the configured dataset before serving if none exists
    #[arg(long)]
    train_if_missing: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ServerConfig::load(&args.config)?;
    init_logging(config.level()?)?;

    info!("=== Income Prediction Server v{} ===", env!("CARGO_PKG_VERSION"));

    if args.train_if_missing && !config.model_path.exists() {
        info!("Training the income prediction model...");
        let training = TrainingConfig {
            dataset_path: config.dataset_path.clone(),
            model_path: config.model_path.clone(),
            ..Default::default()
        };
        match tokio::task::spawn_blocking(move || train(&training)).await? {
            Ok(report) => info!(
                "Model training complete (test accuracy {:.4})",
                report.test_accuracy
            ),
            Err(e) => warn!(
                "Model training failed, continuing with rule-based predictions: {}",
                e
            ),
        }
    }

    let metrics = if config.metrics_enabled {
        Some(PrometheusBuilder::new().install_recorder()?)
    } else {
        None
    };

    run_server(config, metrics).await?;

    Ok(())
}
