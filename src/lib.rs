//! Player engagement prediction
//!
//! Encodes game-behaviour attributes into the fixed feature layout of a
//! pre-trained classifier, runs the classifier behind a fitted scaler and
//! reports the predicted engagement level.

pub mod auth;
pub mod data;
pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Case-insensitive comparison used for every categorical field
fn same_label(input: &str, label: &str) -> bool {
    input.trim().eq_ignore_ascii_case(label)
}

/// Player gender (binary scheme: Male = 0, Female = 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl FromStr for Gender {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self> {
        Gender::ALL
            .into_iter()
            .find(|g| same_label(s, g.as_str()))
            .ok_or_else(|| EngagementError::invalid("Gender", s))
    }
}

/// Player region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Europe,
    Other,
    Usa,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Europe, Location::Other, Location::Usa];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Europe => "Europe",
            Location::Other => "Other",
            Location::Usa => "USA",
        }
    }
}

impl FromStr for Location {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self> {
        Location::ALL
            .into_iter()
            .find(|l| same_label(s, l.as_str()))
            .ok_or_else(|| EngagementError::invalid("Location", s))
    }
}

/// Favourite game genre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameGenre {
    Action,
    Adventure,
    Puzzle,
    Rpg,
    Simulation,
    Sports,
    Strategy,
    Other,
}

impl GameGenre {
    pub const ALL: [GameGenre; 8] = [
        GameGenre::Action,
        GameGenre::Adventure,
        GameGenre::Puzzle,
        GameGenre::Rpg,
        GameGenre::Simulation,
        GameGenre::Sports,
        GameGenre::Strategy,
        GameGenre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameGenre::Action => "Action",
            GameGenre::Adventure => "Adventure",
            GameGenre::Puzzle => "Puzzle",
            GameGenre::Rpg => "RPG",
            GameGenre::Simulation => "Simulation",
            GameGenre::Sports => "Sports",
            GameGenre::Strategy => "Strategy",
            GameGenre::Other => "Other",
        }
    }
}

impl FromStr for GameGenre {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self> {
        GameGenre::ALL
            .into_iter()
            .find(|g| same_label(s, g.as_str()))
            .ok_or_else(|| EngagementError::invalid("GameGenre", s))
    }
}

/// Ordinal game difficulty (Easy = 1, Medium = 2, Hard = 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GameDifficulty {
    Easy,
    Medium,
    Hard,
}

impl GameDifficulty {
    pub const ALL: [GameDifficulty; 3] = [
        GameDifficulty::Easy,
        GameDifficulty::Medium,
        GameDifficulty::Hard,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameDifficulty::Easy => "Easy",
            GameDifficulty::Medium => "Medium",
            GameDifficulty::Hard => "Hard",
        }
    }
}

impl FromStr for GameDifficulty {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self> {
        GameDifficulty::ALL
            .into_iter()
            .find(|d| same_label(s, d.as_str()))
            .ok_or_else(|| EngagementError::invalid("GameDifficulty", s))
    }
}

/// A validated player record, ready for encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAttributes {
    pub age: u32,
    pub gender: Gender,
    pub location: Location,
    pub game_genre: GameGenre,
    pub play_time_hours: f32,
    pub in_game_purchases: bool,
    pub game_difficulty: GameDifficulty,
    pub sessions_per_week: u32,
    pub avg_session_duration_minutes: u32,
    pub player_level: u32,
    pub achievements_unlocked: u32,
}

/// Engagement tier reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
    /// Model returned a class outside {1, 2, 3}
    Unknown,
}

impl EngagementLevel {
    /// Decode a raw class label. Unrecognised labels never fail.
    pub fn from_class(class: i64) -> Self {
        match class {
            1 => EngagementLevel::Low,
            2 => EngagementLevel::Medium,
            3 => EngagementLevel::High,
            _ => EngagementLevel::Unknown,
        }
    }
}

impl fmt::Display for EngagementLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngagementLevel::Low => write!(f, "Low"),
            EngagementLevel::Medium => write!(f, "Medium"),
            EngagementLevel::High => write!(f, "High"),
            EngagementLevel::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Model prediction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementPrediction {
    /// Raw class label as returned by the classifier
    pub class: i64,
    pub level: EngagementLevel,
}

impl EngagementPrediction {
    pub fn from_class(class: i64) -> Self {
        EngagementPrediction {
            class,
            level: EngagementLevel::from_class(class),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("Invalid value for {field}: {value:?}")]
    InvalidAttribute { field: &'static str, value: String },

    #[error("Artifact missing or unreadable at {path}: {reason}")]
    MissingArtifact { path: String, reason: String },

    #[error("Artifact at {path} is malformed: {reason}")]
    InvalidArtifact { path: String, reason: String },

    #[error("Input is missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("No active session - log in first")]
    NotLoggedIn,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngagementError {
    pub fn invalid(field: &'static str, value: &str) -> Self {
        EngagementError::InvalidAttribute {
            field,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngagementError>;

/// On-disk format of the classifier artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// Multinomial linear model exported as JSON
    Linear,
    /// Feed-forward network stored as a burn record
    Mlp,
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::Linear => write!(f, "linear"),
            ModelFormat::Mlp => write!(f, "mlp"),
        }
    }
}

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub artifacts: ArtifactConfig,
    pub model: ModelConfig,
    pub auth: AuthConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub model_path: String,
    pub model_format: ModelFormat,
    pub scaler_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Hidden layer widths of the MLP artifact
    pub hidden_dims: Vec<usize>,
    /// Class label for each output logit, in order
    pub classes: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub enabled: bool,
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

/// Salted SHA-256 credential entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    pub salt: String,
    pub password_sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub dataset_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            artifacts: ArtifactConfig {
                model_path: "model/engagement_model.json".to_string(),
                model_format: ModelFormat::Linear,
                scaler_path: "model/scaler.json".to_string(),
            },
            model: ModelConfig {
                hidden_dims: vec![64, 32],
                classes: vec![1, 2, 3],
            },
            auth: AuthConfig {
                enabled: true,
                users: Vec::new(),
            },
            data: DataConfig {
                dataset_path: "data/online_gaming_behavior_dataset.csv".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EngagementError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| EngagementError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EngagementError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
