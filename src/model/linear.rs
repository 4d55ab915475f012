//! Multinomial linear classifier exported as JSON
//!
//! Matches the decision rule of a fitted logistic-regression model: one
//! weight row and intercept per class, predicted class is the highest score.
//! A two-class model may carry a single row, in which case a positive score
//! selects the second class.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::{EngagementError, Result};

use super::{argmax, read_artifact, Classifier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

impl LinearClassifier {
    /// Load from a JSON artifact
    pub fn load(path: &str) -> Result<Self> {
        let content = read_artifact(path)?;
        let model: LinearClassifier =
            serde_json::from_str(&content).map_err(|e| EngagementError::MissingArtifact {
                path: path.to_string(),
                reason: format!("unreadable classifier: {}", e),
            })?;
        model.validate().map_err(|reason| EngagementError::InvalidArtifact {
            path: path.to_string(),
            reason,
        })?;
        log::debug!("Linear classifier with classes {:?}", model.classes);
        Ok(model)
    }

    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.classes.is_empty() {
            return Err("no classes".to_string());
        }
        let rows = if self.is_binary() { 1 } else { self.classes.len() };
        if self.coef.len() != rows || self.intercept.len() != rows {
            return Err(format!(
                "expected {} weight rows and intercepts, got {} and {}",
                rows,
                self.coef.len(),
                self.intercept.len()
            ));
        }
        if let Some(row) = self.coef.iter().find(|r| r.len() != FeatureVector::DIM) {
            return Err(format!(
                "weight row has {} entries, expected {}",
                row.len(),
                FeatureVector::DIM
            ));
        }
        Ok(())
    }

    /// Raw decision score per weight row
    pub fn decision_function(&self, scaled: &FeatureVector) -> Vec<f32> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| {
                row.iter()
                    .zip(scaled.as_slice())
                    .map(|(w, x)| w * x)
                    .sum::<f32>()
                    + b
            })
            .collect()
    }
}

impl Classifier for LinearClassifier {
    fn predict(&self, scaled: &FeatureVector) -> Result<i64> {
        let scores = self.decision_function(scaled);
        if self.is_binary() {
            let idx = if scores[0] > 0.0 { 1 } else { 0 };
            return Ok(self.classes[idx]);
        }
        argmax(&scores)
            .map(|i| self.classes[i])
            .ok_or_else(|| EngagementError::Inference("empty decision scores".to_string()))
    }

    fn describe(&self) -> String {
        format!("linear, {} classes {:?}", self.classes.len(), self.classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// Scores class 1 on feature 0, class 2 on feature 1, class 3 on feature 2
    fn diagonal() -> LinearClassifier {
        let mut coef = vec![vec![0.0f32; FeatureVector::DIM]; 3];
        for (i, row) in coef.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        LinearClassifier {
            classes: vec![1, 2, 3],
            coef,
            intercept: vec![0.0; 3],
        }
    }

    fn one_hot(i: usize) -> FeatureVector {
        let mut values = [0.0f32; FeatureVector::DIM];
        values[i] = 1.0;
        FeatureVector::from_array(values)
    }

    #[test]
    fn test_predicts_highest_score() {
        let model = diagonal();
        assert_eq!(model.predict(&one_hot(0)).unwrap(), 1);
        assert_eq!(model.predict(&one_hot(1)).unwrap(), 2);
        assert_eq!(model.predict(&one_hot(2)).unwrap(), 3);
    }

    #[test]
    fn test_intercept_breaks_ties() {
        let mut model = diagonal();
        model.intercept = vec![0.0, 0.0, 0.5];
        assert_eq!(model.predict(&one_hot(10)).unwrap(), 3);
    }

    #[test]
    fn test_binary_single_row() {
        let mut row = vec![0.0f32; FeatureVector::DIM];
        row[0] = 1.0;
        let model = LinearClassifier {
            classes: vec![1, 3],
            coef: vec![row],
            intercept: vec![-0.5],
        };
        assert_eq!(model.predict(&one_hot(0)).unwrap(), 3);
        assert_eq!(model.predict(&one_hot(1)).unwrap(), 1);
    }

    #[test]
    fn test_load_roundtrip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&diagonal()).unwrap().as_bytes())
            .unwrap();
        let model = LinearClassifier::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(model, diagonal());
    }

    #[test]
    fn test_short_weight_row_is_invalid() {
        let mut model = diagonal();
        model.coef[1].pop();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&model).unwrap().as_bytes())
            .unwrap();
        let err = LinearClassifier::load(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, EngagementError::InvalidArtifact { .. }));
    }
}
