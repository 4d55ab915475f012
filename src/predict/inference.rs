//! Model inference for predictions

use crate::features::{encode, FeatureVector, RawPlayerRecord};
use crate::model::{load_classifier, load_scaler, Classifier, Scaler};
use crate::{Config, EngagementPrediction, PlayerAttributes, Result};

/// Scaler + classifier pair used for every prediction
pub struct Predictor {
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
}

impl Predictor {
    /// Create a predictor from already loaded artifacts
    pub fn new(scaler: Box<dyn Scaler>, classifier: Box<dyn Classifier>) -> Self {
        Predictor { scaler, classifier }
    }

    /// Load both artifacts named in the config
    pub fn load(config: &Config) -> Result<Self> {
        let scaler = load_scaler(config)?;
        let classifier = load_classifier(config)?;
        log::info!("Loaded classifier: {}", classifier.describe());
        Ok(Self::new(Box::new(scaler), classifier))
    }

    /// Predict a single validated record
    pub fn predict(&self, attrs: &PlayerAttributes) -> Result<EngagementPrediction> {
        let features = encode(attrs);
        log::debug!("Encoded features: {:?}", features.as_slice());
        self.predict_features(&features)
    }

    /// Validate, encode and predict an untyped record
    pub fn predict_raw(&self, raw: &RawPlayerRecord) -> Result<EngagementPrediction> {
        let attrs = PlayerAttributes::try_from(raw)?;
        self.predict(&attrs)
    }

    /// Predict from an encoded (unscaled) feature vector
    pub fn predict_features(&self, features: &FeatureVector) -> Result<EngagementPrediction> {
        let scaled = self.scaler.transform(features);
        let class = self.classifier.predict(&scaled)?;
        Ok(EngagementPrediction::from_class(class))
    }

    /// Predict many encoded vectors in one classifier call
    pub fn predict_many(&self, features: &[FeatureVector]) -> Result<Vec<EngagementPrediction>> {
        let scaled: Vec<FeatureVector> = features.iter().map(|f| self.scaler.transform(f)).collect();
        let classes = self.classifier.predict_batch(&scaled)?;
        Ok(classes.into_iter().map(EngagementPrediction::from_class).collect())
    }

    pub fn describe(&self) -> String {
        self.classifier.describe()
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &EngagementPrediction, attrs: &PlayerAttributes) -> String {
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  Player: age {}, {}, {}
│  Genre:  {} ({} difficulty)
├─────────────────────────────────────────────────┤
│  Predicted engagement:  {}
│  Model class:           {}
└─────────────────────────────────────────────────┘
"#,
        attrs.age,
        attrs.gender.as_str(),
        attrs.location.as_str(),
        attrs.game_genre.as_str(),
        attrs.game_difficulty.as_str(),
        pred.level,
        pred.class
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{LinearClassifier, StandardScaler};
    use crate::{EngagementError, EngagementLevel, GameDifficulty, GameGenre, Gender, Location};

    /// Classifier that always answers with the same label
    pub(crate) struct FixedClassifier(pub i64);

    impl Classifier for FixedClassifier {
        fn predict(&self, _scaled: &FeatureVector) -> Result<i64> {
            Ok(self.0)
        }

        fn describe(&self) -> String {
            format!("fixed {}", self.0)
        }
    }

    /// Linear model keyed on the difficulty code: Easy → 1, Medium → 2, Hard → 3
    pub(crate) fn difficulty_predictor() -> Predictor {
        let mut coef = vec![vec![0.0f32; FeatureVector::DIM]; 3];
        coef[0][4] = -10.0;
        coef[2][4] = 10.0;
        let classifier = LinearClassifier {
            classes: vec![1, 2, 3],
            coef,
            intercept: vec![15.0, 0.0, -25.0],
        };
        Predictor::new(Box::new(StandardScaler::identity()), Box::new(classifier))
    }

    fn player(difficulty: GameDifficulty) -> PlayerAttributes {
        PlayerAttributes {
            age: 30,
            gender: Gender::Female,
            location: Location::Other,
            game_genre: GameGenre::Puzzle,
            play_time_hours: 8.0,
            in_game_purchases: false,
            game_difficulty: difficulty,
            sessions_per_week: 3,
            avg_session_duration_minutes: 60,
            player_level: 12,
            achievements_unlocked: 4,
        }
    }

    #[test]
    fn test_predict_through_scaler_and_classifier() {
        let predictor = difficulty_predictor();
        assert_eq!(
            predictor.predict(&player(GameDifficulty::Easy)).unwrap().level,
            EngagementLevel::Low
        );
        assert_eq!(
            predictor.predict(&player(GameDifficulty::Medium)).unwrap().level,
            EngagementLevel::Medium
        );
        assert_eq!(
            predictor.predict(&player(GameDifficulty::Hard)).unwrap().level,
            EngagementLevel::High
        );
    }

    #[test]
    fn test_unexpected_class_renders_unknown() {
        let predictor = Predictor::new(
            Box::new(StandardScaler::identity()),
            Box::new(FixedClassifier(7)),
        );
        let pred = predictor.predict(&player(GameDifficulty::Easy)).unwrap();
        assert_eq!(pred.class, 7);
        assert_eq!(pred.level, EngagementLevel::Unknown);
        assert!(format_prediction(&pred, &player(GameDifficulty::Easy)).contains("Unknown"));
    }

    #[test]
    fn test_predict_raw_surfaces_invalid_attribute() {
        let predictor = difficulty_predictor();
        let raw = RawPlayerRecord {
            age: "30".into(),
            gender: "Other".into(),
            ..RawPlayerRecord::default()
        };
        assert!(matches!(
            predictor.predict_raw(&raw),
            Err(EngagementError::InvalidAttribute { field: "Gender", .. })
        ));
    }

    #[test]
    fn test_predict_many_matches_single() {
        let predictor = difficulty_predictor();
        let features: Vec<FeatureVector> = GameDifficulty::ALL
            .iter()
            .map(|&d| encode(&player(d)))
            .collect();
        let many = predictor.predict_many(&features).unwrap();
        let single: Vec<_> = features
            .iter()
            .map(|f| predictor.predict_features(f).unwrap())
            .collect();
        assert_eq!(many, single);
    }
}
