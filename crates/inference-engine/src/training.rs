//! Training Pipeline
//!
//! Load, split, preprocess, grid-search, evaluate, validate and save.

use crate::artifact::{ModelArtifact, DEFAULT_MODEL_PATH};
use crate::forest::ForestParams;
use crate::metrics::{accuracy, ClassificationReport};
use crate::search::{GridSearch, ParamGrid};
use crate::InferenceError;
use census_data::{load_dataset, CensusRecord, Dataset, Income};
use feature_engine::Preprocessor;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Training run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Census CSV file
    pub dataset_path: PathBuf,
    /// Where the artifact is written
    pub model_path: PathBuf,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed for the split and the forests
    pub seed: u64,
    /// Cross-validation folds
    pub folds: usize,
    pub grid: ParamGrid,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("adult.csv"),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            test_size: 0.2,
            seed: 42,
            folds: 3,
            grid: ParamGrid::default(),
        }
    }
}

/// Outcome of checking a reference profile against the trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCheck {
    pub name: String,
    pub expected: Income,
    pub predicted: Income,
}

impl ProfileCheck {
    pub fn is_correct(&self) -> bool {
        self.expected == self.predicted
    }
}

/// Summary of a training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub train_samples: usize,
    pub test_samples: usize,
    pub best_params: ForestParams,
    pub cv_score: f64,
    pub test_accuracy: f64,
    pub classification: ClassificationReport,
    pub profile_checks: Vec<ProfileCheck>,
    /// Most important first
    pub feature_importances: Vec<(String, f64)>,
}

/// Shuffle row indices and split them into (train, test)
///
/// The test part takes `ceil(n * test_size)` rows.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let n_test = ((n as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let train = indices.split_off(n_test.min(n));
    (train, indices)
}

/// Reference profiles with their expected income class
pub fn reference_profiles() -> Vec<(&'static str, CensusRecord, Income)> {
    vec![
        (
            "Young service worker",
            CensusRecord::young_service_profile(),
            Income::AtMost50K,
        ),
        (
            "Executive with higher education",
            CensusRecord::executive_profile(),
            Income::Above50K,
        ),
    ]
}

/// Run the whole pipeline from the dataset file and save the artifact
pub fn train(config: &TrainingConfig) -> Result<TrainingReport, InferenceError> {
    info!("Starting income prediction model training...");
    let dataset = load_dataset(&config.dataset_path)?;
    let (artifact, report) = train_on_dataset(&dataset, config)?;
    artifact.save(&config.model_path)?;
    Ok(report)
}

/// Run the pipeline on an in-memory dataset without touching disk
pub fn train_on_dataset(
    dataset: &Dataset,
    config: &TrainingConfig,
) -> Result<(ModelArtifact, TrainingReport), InferenceError> {
    if !(0.0..1.0).contains(&config.test_size) || config.test_size == 0.0 {
        return Err(InferenceError::InvalidTrainingData(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let (train_idx, test_idx) = train_test_split(dataset.len(), config.test_size, config.seed);
    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(InferenceError::InvalidTrainingData(format!(
            "dataset of {} rows is too small to split",
            dataset.len()
        )));
    }
    let train_set = dataset.select(&train_idx);
    let test_set = dataset.select(&test_idx);
    info!(
        "Data split: {} training samples, {} testing samples",
        train_set.len(),
        test_set.len()
    );

    // Encoders and scalers see the training split only
    info!("Training preprocessors...");
    let preprocessor = Preprocessor::fit(train_set.records())?;

    info!("Preprocessing training and test data...");
    let x_train = preprocessor.transform_batch(train_set.records());
    let x_test = preprocessor.transform_batch(test_set.records());
    let y_train: Vec<usize> = train_set.incomes().iter().map(Income::class_index).collect();

    info!("Training model with hyperparameter tuning...");
    let search = GridSearch::new(config.grid.clone(), config.folds, config.seed);
    let outcome = search.fit(x_train.view(), &y_train)?;

    info!("Evaluating model on test data...");
    let predicted = outcome.model.predict_batch(x_test.view())?;
    let test_accuracy = accuracy(test_set.incomes(), &predicted);
    let classification = ClassificationReport::new(test_set.incomes(), &predicted);
    info!("Test accuracy: {:.4}", test_accuracy);

    let artifact = ModelArtifact::new(preprocessor, outcome.model, test_accuracy);

    info!("Validating with sample profiles...");
    let mut profile_checks = Vec::new();
    for (name, profile, expected) in reference_profiles() {
        let row = Array1::from(artifact.preprocessor.transform(&profile).values);
        let predicted = artifact.forest.predict(row.view())?;
        let check = ProfileCheck {
            name: name.to_string(),
            expected,
            predicted,
        };
        if check.is_correct() {
            info!("{}: predicted {}, expected {}, correct", name, predicted, expected);
        } else {
            warn!("{}: predicted {}, expected {}, INCORRECT", name, predicted, expected);
        }
        profile_checks.push(check);
    }

    let feature_importances = artifact.ranked_importances();
    for (name, importance) in &feature_importances {
        info!("{}: {:.4}", name, importance);
    }

    let report = TrainingReport {
        train_samples: train_set.len(),
        test_samples: test_set.len(),
        best_params: outcome.best_params,
        cv_score: outcome.best_score,
        test_accuracy,
        classification,
        profile_checks,
        feature_importances,
    };
    Ok((artifact, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::synthetic_dataset;
    use crate::InferenceEngine;

    fn quick_config(dir: &std::path::Path) -> TrainingConfig {
        TrainingConfig {
            dataset_path: dir.join("adult.csv"),
            model_path: dir.join("models").join("income_predictor.bin"),
            grid: ParamGrid {
                n_estimators: vec![8],
                max_depth: vec![Some(4), None],
                min_samples_split: vec![2],
                min_samples_leaf: vec![1],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_split_sizes_and_disjoint() {
        let (train, test) = train_test_split(101, 0.2, 42);
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
        assert_eq!(train_test_split(101, 0.2, 42), (train, test));
    }

    #[test]
    fn test_invalid_test_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            test_size: 1.5,
            ..quick_config(dir.path())
        };
        assert!(train_on_dataset(&synthetic_dataset(30), &config).is_err());
    }

    #[test]
    fn test_pipeline_on_separable_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path());
        let (artifact, report) = train_on_dataset(&synthetic_dataset(150), &config).unwrap();

        assert_eq!(report.train_samples + report.test_samples, 150);
        assert!(report.test_accuracy > 0.95);
        assert!(report.profile_checks.iter().all(ProfileCheck::is_correct));
        assert_eq!(report.feature_importances.len(), 14);
        assert_eq!(artifact.best_params, report.best_params);
    }

    #[test]
    fn test_train_writes_loadable_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = quick_config(dir.path());

        let mut csv = String::from(
            "age,workclass,fnlwgt,education,educational-num,marital-status,occupation,relationship,race,gender,capital-gain,capital-loss,hours-per-week,native-country,income\n",
        );
        for (r, income) in synthetic_dataset(90).iter() {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                r.age,
                r.workclass,
                r.fnlwgt,
                r.education,
                r.educational_num,
                r.marital_status,
                r.occupation,
                r.relationship,
                r.race,
                r.gender,
                r.capital_gain,
                r.capital_loss,
                r.hours_per_week,
                r.native_country,
                income
            ));
        }
        std::fs::write(&config.dataset_path, csv).unwrap();

        train(&config).unwrap();
        assert!(config.model_path.exists());

        let mut engine = InferenceEngine::new(&config.model_path);
        assert!(engine.refresh().unwrap());
        let prediction = engine.predict(&CensusRecord::executive_profile()).unwrap();
        assert_eq!(prediction.income, Income::Above50K);
    }
}
