//! Shared test fixtures
//!
//! Compiled for this crate's tests and, through the `test-fixtures`
//! feature, for the tests of crates that serve the model.

use crate::artifact::ModelArtifact;
use crate::forest::{ForestParams, RandomForest};
use crate::InferenceError;
use census_data::{CensusRecord, Dataset, Income};
use feature_engine::Preprocessor;

/// Separable dataset: every third row is an executive earning `>50K`
pub fn synthetic_dataset(n: usize) -> Dataset {
    labelled_dataset(n, |executive| {
        if executive {
            Income::Above50K
        } else {
            Income::AtMost50K
        }
    })
}

/// Same rows as [`synthetic_dataset`] with every label flipped, so a model
/// trained on it scores the young service workers as `>50K`
pub fn inverted_dataset(n: usize) -> Dataset {
    labelled_dataset(n, |executive| {
        if executive {
            Income::AtMost50K
        } else {
            Income::Above50K
        }
    })
}

fn labelled_dataset(n: usize, label: impl Fn(bool) -> Income) -> Dataset {
    (0..n)
        .map(|i| {
            let executive = i % 3 == 0;
            let mut record = if executive {
                CensusRecord::executive_profile()
            } else {
                CensusRecord::young_service_profile()
            };
            record.age += (i % 7) as i64;
            record.hours_per_week += (i % 5) as i64;
            record.fnlwgt += (i * 37 % 1000) as i64;
            (record, label(executive))
        })
        .collect()
}

/// Fit a ten-tree forest on the whole dataset
pub fn artifact_for(dataset: &Dataset, seed: u64) -> Result<ModelArtifact, InferenceError> {
    let preprocessor = Preprocessor::fit(dataset.records())?;
    let x = preprocessor.transform_batch(dataset.records());
    let labels: Vec<usize> = dataset.incomes().iter().map(Income::class_index).collect();
    let params = ForestParams {
        n_estimators: 10,
        ..Default::default()
    };
    let forest = RandomForest::fit(x.view(), &labels, params, seed)?;
    Ok(ModelArtifact::new(preprocessor, forest, 1.0))
}

/// Small trained artifact over [`synthetic_dataset`]
pub fn small_artifact() -> Result<ModelArtifact, InferenceError> {
    artifact_for(&synthetic_dataset(60), 1)
}
