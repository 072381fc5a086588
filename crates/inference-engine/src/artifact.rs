//! Serialized Model Artifact

use crate::forest::{ForestParams, RandomForest};
use crate::InferenceError;
use feature_engine::{Preprocessor, FEATURE_ORDER};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Bumped whenever the artifact layout changes
pub const ARTIFACT_VERSION: u32 = 1;

/// Default location of the trained model
pub const DEFAULT_MODEL_PATH: &str = "models/income_predictor.bin";

/// Everything needed to serve predictions: preprocessing and classifier together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub feature_order: Vec<String>,
    pub preprocessor: Preprocessor,
    pub forest: RandomForest,
    pub best_params: ForestParams,
    pub test_accuracy: f64,
    pub trained_at_ms: u64,
}

impl ModelArtifact {
    pub fn new(preprocessor: Preprocessor, forest: RandomForest, test_accuracy: f64) -> Self {
        let trained_at_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            version: ARTIFACT_VERSION,
            feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            best_params: *forest.params(),
            preprocessor,
            forest,
            test_accuracy,
            trained_at_ms,
        }
    }

    /// Write the artifact through a sibling temp file, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), InferenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created model directory {}", parent.display());
            }
        }
        let bytes = postcard::to_allocvec(self)?;

        // Readers of `path` only ever see a complete artifact
        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);
        if let Err(e) = std::fs::write(&temp_path, &bytes) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        std::fs::rename(&temp_path, path)?;
        info!("Saved model to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Read and validate an artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {}", path.display(), e))
        })?;
        let artifact: ModelArtifact = postcard::from_bytes(&bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Reject artifacts whose layout differs from this build's preprocessing
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.version != ARTIFACT_VERSION {
            return Err(InferenceError::IncompatibleModel(format!(
                "artifact version {} (expected {})",
                self.version, ARTIFACT_VERSION
            )));
        }
        if self.feature_order.iter().map(String::as_str).ne(FEATURE_ORDER.iter().copied()) {
            return Err(InferenceError::IncompatibleModel(format!(
                "feature order {:?}",
                self.feature_order
            )));
        }
        self.preprocessor.validate()?;
        if self.forest.n_features() != FEATURE_ORDER.len() || !self.forest.is_well_formed() {
            return Err(InferenceError::IncompatibleModel(
                "forest structure is invalid".to_string(),
            ));
        }
        Ok(())
    }

    /// Feature names paired with importances, most important first
    pub fn ranked_importances(&self) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .feature_order
            .iter()
            .cloned()
            .zip(self.forest.feature_importances().iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::small_artifact;

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("income_predictor.bin");
        let artifact = small_artifact().unwrap();

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"stale").unwrap();
        artifact.save(&path).unwrap();

        assert_eq!(ModelArtifact::load(&path).unwrap(), artifact);
        let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("income_predictor.bin")]);
    }

    #[test]
    fn test_save_creates_model_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.bin");
        small_artifact().unwrap().save(&path).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested").join("model.bin.tmp").exists());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut artifact = small_artifact().unwrap();
        artifact.version += 1;
        assert!(matches!(
            artifact.validate(),
            Err(InferenceError::IncompatibleModel(_))
        ));
    }
}
