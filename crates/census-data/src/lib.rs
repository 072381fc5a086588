//! Census Data
//!
//! Record types for the Adult census dataset, CSV loading, prediction
//! request validation, and descriptive summaries.

mod error;
mod loader;
mod record;
pub mod summary;
mod validator;

pub use error::{DataError, ValidationError};
pub use loader::{load_dataset, read_dataset, INCOME_COLUMN};
pub use record::{
    education_number, CategoricalColumn, CensusRecord, Dataset, Income, NumericColumn,
};
pub use validator::{
    ProfileInput, DEFAULT_MARITAL_STATUS, DEFAULT_RACE, DEFAULT_RELATIONSHIP, REQUIRED_FIELDS,
};
