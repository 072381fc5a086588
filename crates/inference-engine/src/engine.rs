//! Inference Engine Implementation

use crate::artifact::ModelArtifact;
use crate::InferenceError;
use census_data::{CensusRecord, Income};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Prediction result from inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted income class
    pub income: Income,
    /// Probability of `>50K` (0.0 to 1.0)
    pub probability: f64,
}

/// Where the loaded model came from
#[derive(Debug)]
enum ModelSource {
    /// Loaded from the model path; `modified` is the file mtime at load time
    File { modified: Option<SystemTime> },
    /// Supplied directly and never reloaded
    Pinned,
}

/// Serves predictions from a trained model artifact on disk
///
/// The file is re-checked on [`InferenceEngine::refresh`], so a model trained
/// while the server runs is picked up, and a deleted model falls back to
/// "no model".
pub struct InferenceEngine {
    /// Model path
    model_path: PathBuf,
    /// Loaded artifact, if any
    model: Option<(ModelArtifact, ModelSource)>,
}

impl InferenceEngine {
    /// Create an engine for the given path without loading anything yet
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        let model_path = model_path.as_ref().to_path_buf();
        info!("Creating inference engine with model: {}", model_path.display());
        Self {
            model_path,
            model: None,
        }
    }

    /// Create an engine around an in-memory artifact
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            model_path: PathBuf::from("memory"),
            model: Some((artifact, ModelSource::Pinned)),
        }
    }

    /// Sync the loaded model with the file on disk; returns whether a model is available
    pub fn refresh(&mut self) -> Result<bool, InferenceError> {
        if let Some((_, ModelSource::Pinned)) = &self.model {
            return Ok(true);
        }

        let metadata = match std::fs::metadata(&self.model_path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if self.model.take().is_some() {
                    warn!("Model file removed: {}", self.model_path.display());
                }
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        let modified = metadata.modified().ok();
        if let Some((_, ModelSource::File { modified: loaded_at })) = &self.model {
            if *loaded_at == modified {
                return Ok(true);
            }
        }

        self.load_file(modified)?;
        Ok(true)
    }

    /// Load the model file unconditionally
    pub fn load(&mut self) -> Result<(), InferenceError> {
        let modified = std::fs::metadata(&self.model_path)
            .and_then(|m| m.modified())
            .ok();
        self.load_file(modified)
    }

    fn load_file(&mut self, modified: Option<SystemTime>) -> Result<(), InferenceError> {
        let artifact = ModelArtifact::load(&self.model_path)?;
        info!(
            "Model loaded from {} ({} trees, test accuracy {:.4})",
            self.model_path.display(),
            artifact.forest.n_trees(),
            artifact.test_accuracy
        );
        self.model = Some((artifact, ModelSource::File { modified }));
        Ok(())
    }

    /// Run inference on one record
    pub fn predict(&self, record: &CensusRecord) -> Result<Prediction, InferenceError> {
        let start = std::time::Instant::now();
        let (artifact, _) = self.model.as_ref().ok_or(InferenceError::ModelNotLoaded)?;

        let features = artifact.preprocessor.transform(record);
        let row = Array1::from(features.values);
        let probability = artifact.forest.predict_proba(row.view())?;
        let income = if probability > 0.5 {
            Income::Above50K
        } else {
            Income::AtMost50K
        };

        debug!(
            "Inference completed in {}us: {} (p={:.3})",
            start.elapsed().as_micros(),
            income,
            probability
        );
        Ok(Prediction {
            income,
            probability,
        })
    }

    /// Check if a model is loaded
    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Whether the model file currently exists on disk
    pub fn model_exists(&self) -> bool {
        match &self.model {
            Some((_, ModelSource::Pinned)) => true,
            _ => self.model_path.exists(),
        }
    }

    /// Loaded artifact, if any
    pub fn artifact(&self) -> Option<&ModelArtifact> {
        self.model.as_ref().map(|(a, _)| a)
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::small_artifact;

    #[test]
    fn test_missing_file_means_no_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = InferenceEngine::new(dir.path().join("absent.bin"));
        assert!(!engine.refresh().unwrap());
        assert!(!engine.is_loaded());
        assert!(matches!(
            engine.predict(&CensusRecord::executive_profile()),
            Err(InferenceError::ModelNotLoaded)
        ));
    }

    #[test]
    fn test_refresh_picks_up_and_drops_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("m.bin");
        let mut engine = InferenceEngine::new(&path);
        assert!(!engine.refresh().unwrap());

        small_artifact().unwrap().save(&path).unwrap();
        assert!(engine.refresh().unwrap());
        assert!(engine.is_loaded());
        assert!(engine.model_exists());

        std::fs::remove_file(&path).unwrap();
        assert!(!engine.refresh().unwrap());
        assert!(!engine.is_loaded());
    }

    #[test]
    fn test_predicts_reference_profiles() {
        let engine = InferenceEngine::with_artifact(small_artifact().unwrap());
        let exec = engine.predict(&CensusRecord::executive_profile()).unwrap();
        let young = engine.predict(&CensusRecord::young_service_profile()).unwrap();
        assert_eq!(exec.income, Income::Above50K);
        assert_eq!(young.income, Income::AtMost50K);
        assert!(exec.probability > young.probability);
    }

    #[test]
    fn test_corrupt_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, b"not a model").unwrap();
        let mut engine = InferenceEngine::new(&path);
        assert!(engine.refresh().is_err());
        assert!(!engine.is_loaded());
    }
}
