//! Feature Engineering Engine
//!
//! Turns census records into fixed-order numeric feature vectors: label
//! encoding for categorical columns and standard scaling for numeric ones.

mod encoder;
mod features;
mod scaler;
mod statistics;

pub use encoder::{LabelEncoder, UNSEEN_CODE};
pub use features::{Feature, FeatureVector, Preprocessor, FEATURE_DIMENSION, FEATURE_ORDER};
pub use scaler::StandardScaler;
pub use statistics::{quantile_sorted, ColumnStats};

use thiserror::Error;

/// Errors during feature preprocessing
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Cannot fit preprocessor on an empty record set")]
    EmptyInput,
    #[error("Preprocessor layout mismatch: {0}")]
    LayoutMismatch(String),
}
