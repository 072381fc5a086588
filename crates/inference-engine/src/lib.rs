//! Income Inference Engine
//!
//! Random forest classifier over preprocessed census features: training with
//! cross-validated grid search, evaluation metrics, a single-file model
//! artifact, and an engine that serves predictions from it.

mod artifact;
mod engine;
mod forest;
mod metrics;
mod search;
mod training;
mod tree;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use artifact::{ModelArtifact, ARTIFACT_VERSION, DEFAULT_MODEL_PATH};
pub use engine::{InferenceEngine, Prediction};
pub use forest::{ForestParams, RandomForest};
pub use metrics::{accuracy, ClassMetrics, ClassificationReport};
pub use search::{stratified_folds, CvResult, GridSearch, ParamGrid, SearchOutcome};
pub use training::{
    reference_profiles, train, train_on_dataset, train_test_split, ProfileCheck, TrainingConfig,
    TrainingReport,
};
pub use tree::{DecisionTree, TreeParams};

use thiserror::Error;

/// Errors during training and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("No trained model is loaded")]
    ModelNotLoaded,
    #[error("Incompatible model artifact: {0}")]
    IncompatibleModel(String),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },
    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),
    #[error("Dataset error: {0}")]
    Data(#[from] census_data::DataError),
    #[error("Preprocessing error: {0}")]
    Feature(#[from] feature_engine::FeatureError),
    #[error("Model serialization error: {0}")]
    Serialization(#[from] postcard::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
