//! Data Error Types

use thiserror::Error;

/// Errors while loading the census dataset
#[derive(Debug, Error)]
pub enum DataError {
    /// Underlying file error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Column required for training is absent
    #[error("Required column '{0}' was not found in the dataset")]
    ColumnNotFound(&'static str),

    /// Numeric column holds a non-numeric value
    #[error("Row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Income label outside the two known classes
    #[error("Row {row}: unknown income label '{value}'")]
    InvalidLabel { row: usize, value: String },

    /// Dataset holds no rows
    #[error("Dataset is empty")]
    Empty,
}

/// Errors while validating a prediction request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// One or more required fields are absent
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// Field present but not convertible
    #[error("Invalid value for '{field}': {value}")]
    InvalidValue { field: &'static str, value: String },

    /// Request body is not a JSON object
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
