//! Standardization scaler loaded from a fitted artifact

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::{EngagementError, Result};

use super::{read_artifact, Scaler};

/// Per-feature z-score transform: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    /// Identity transform (mean 0, scale 1)
    pub fn identity() -> Self {
        StandardScaler {
            mean: vec![0.0; FeatureVector::DIM],
            scale: vec![1.0; FeatureVector::DIM],
        }
    }

    /// Load from a JSON artifact
    pub fn load(path: &str) -> Result<Self> {
        let content = read_artifact(path)?;
        let scaler: StandardScaler =
            serde_json::from_str(&content).map_err(|e| EngagementError::MissingArtifact {
                path: path.to_string(),
                reason: format!("unreadable scaler: {}", e),
            })?;
        scaler.validate().map_err(|reason| EngagementError::InvalidArtifact {
            path: path.to_string(),
            reason,
        })?;
        Ok(scaler)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.mean.len() != FeatureVector::DIM || self.scale.len() != FeatureVector::DIM {
            return Err(format!(
                "expected {} means and scales, got {} and {}",
                FeatureVector::DIM,
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.iter().chain(&self.scale).any(|v| !v.is_finite()) {
            return Err("non-finite scaler parameter".to_string());
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = [0.0f32; FeatureVector::DIM];
        for (i, slot) in out.iter_mut().enumerate() {
            // Constant training columns were fitted with scale 0
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            *slot = (features[i] - self.mean[i]) / scale;
        }
        FeatureVector::from_array(out)
    }
}
