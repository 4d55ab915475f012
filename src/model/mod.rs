//! Pre-trained prediction artifacts
//!
//! The classifier and the scaler are opaque, externally trained artifacts.
//! This module only loads them and exposes the two contracts the predictor
//! relies on:
//! - [`Scaler`]: vector in, scaled vector out
//! - [`Classifier`]: scaled vector in, integer class out

pub mod linear;
pub mod mlp;
pub mod scaler;

use std::path::Path;

use crate::features::FeatureVector;
use crate::{Config, EngagementError, ModelFormat, Result};

pub use linear::LinearClassifier;
pub use mlp::{MlpClassifier, MlpConfig, MlpNetwork};
pub use scaler::StandardScaler;

/// Backend used for inference on the CPU
pub type InferenceBackend = burn::backend::NdArray<f32>;

/// Fitted feature transform applied before classification
pub trait Scaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector;
}

/// Trained classifier: scaled features in, class label out
pub trait Classifier {
    fn predict(&self, scaled: &FeatureVector) -> Result<i64>;

    fn predict_batch(&self, scaled: &[FeatureVector]) -> Result<Vec<i64>> {
        scaled.iter().map(|v| self.predict(v)).collect()
    }

    /// Short human-readable description for `model info`
    fn describe(&self) -> String;
}

/// Read an artifact file, mapping any failure to `MissingArtifact`
pub(crate) fn read_artifact(path: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| EngagementError::MissingArtifact {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Index of the largest value; ties resolve to the first
pub(crate) fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Load the configured classifier artifact
pub fn load_classifier(config: &Config) -> Result<Box<dyn Classifier>> {
    let path = &config.artifacts.model_path;
    match config.artifacts.model_format {
        ModelFormat::Linear => {
            log::debug!("Loading linear classifier from {}", path);
            Ok(Box::new(LinearClassifier::load(path)?))
        }
        ModelFormat::Mlp => {
            log::debug!("Loading MLP classifier from {}.mpk", path);
            let device = Default::default();
            let mlp_config = MlpConfig::from_model_config(&config.model);
            let classifier =
                MlpClassifier::<InferenceBackend>::load(&device, path, mlp_config)?;
            Ok(Box::new(classifier))
        }
    }
}

/// Load the configured scaler artifact
pub fn load_scaler(config: &Config) -> Result<StandardScaler> {
    log::debug!("Loading scaler from {}", config.artifacts.scaler_path);
    StandardScaler::load(&config.artifacts.scaler_path)
}

/// Path of the file that actually backs the configured classifier
pub fn model_file(config: &Config) -> String {
    match config.artifacts.model_format {
        ModelFormat::Linear => config.artifacts.model_path.clone(),
        ModelFormat::Mlp => format!("{}.mpk", config.artifacts.model_path),
    }
}

/// True when both artifact files are present on disk
pub fn artifacts_present(config: &Config) -> bool {
    Path::new(&model_file(config)).exists() && Path::new(&config.artifacts.scaler_path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), Some(0));
        assert_eq!(argmax(&[-3.0, -1.0]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_missing_artifact() {
        let mut config = Config::default();
        config.artifacts.model_path = "/nonexistent/engagement_model.json".to_string();
        match load_classifier(&config) {
            Err(EngagementError::MissingArtifact { path, .. }) => {
                assert_eq!(path, "/nonexistent/engagement_model.json")
            }
            Err(e) => panic!("expected MissingArtifact, got {}", e),
            Ok(_) => panic!("expected MissingArtifact"),
        }
    }

    #[test]
    fn test_model_file_for_mlp() {
        let mut config = Config::default();
        config.artifacts.model_format = ModelFormat::Mlp;
        config.artifacts.model_path = "model/net".to_string();
        assert_eq!(model_file(&config), "model/net.mpk");
    }
}
