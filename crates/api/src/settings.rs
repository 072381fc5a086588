//! Server Settings

use config::{Config, ConfigError, Environment, File};
use inference_engine::DEFAULT_MODEL_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_PATH: &str = "income.toml";

/// Web server settings
///
/// Values come from an optional TOML file, then from `INCOME__*` environment
/// variables (for example `INCOME__BIND=127.0.0.1:8080`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Trained model artifact
    pub model_path: PathBuf,
    /// Census CSV used by `--train-if-missing`
    pub dataset_path: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    pub log_level: String,
    /// Install the Prometheus recorder and expose `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            dataset_path: PathBuf::from("adult.csv"),
            static_dir: PathBuf::from("static"),
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    /// Load from the given file (if it exists) and the environment
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("INCOME").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Parsed log level
    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::Message(format!("invalid log level '{}'", self.log_level)))
    }
}
