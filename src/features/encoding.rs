//! Feature encoding for the engagement classifier
//!
//! ### Layout
//! The classifier was trained on 16 positional columns. Nothing about the
//! order is recorded in the model artifact, so it must match exactly:
//!
//! - **[0]** age
//! - **[1]** gender: Male = 0, Female = 1
//! - **[2]** play time in hours
//! - **[3]** in-game purchases: No = 0, Yes = 1
//! - **[4]** difficulty: Easy = 1, Medium = 2, Hard = 3
//! - **[5..9]** sessions/week, avg session minutes, player level, achievements
//! - **[9..12]** location indicators: Europe, Other, USA (all three kept)
//! - **[12..16]** genre indicators: RPG, Simulation, Sports, Strategy
//!
//! Action, Adventure, Puzzle and Other have no indicator and encode as all
//! four genre fields at zero. That collapse is part of the trained schema and
//! is kept as-is.

use std::ops::Index;

use serde::Serialize;

use crate::{GameDifficulty, GameGenre, Gender, Location, PlayerAttributes, Result};

use super::record::RawPlayerRecord;

/// Column names of the feature layout, in model order
pub const FEATURE_NAMES: [&str; FeatureVector::DIM] = [
    "Age",
    "Gender",
    "PlayTimeHours",
    "InGamePurchases",
    "GameDifficulty",
    "SessionsPerWeek",
    "AvgSessionDurationMinutes",
    "PlayerLevel",
    "AchievementsUnlocked",
    "Location_Europe",
    "Location_Other",
    "Location_USA",
    "GameGenre_RPG",
    "GameGenre_Simulation",
    "GameGenre_Sports",
    "GameGenre_Strategy",
];

const LOCATION_OFFSET: usize = 9;
const GENRE_OFFSET: usize = 12;

/// Fixed-order numeric input for the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f32; FeatureVector::DIM]);

impl FeatureVector {
    pub const DIM: usize = 16;

    pub fn from_array(values: [f32; Self::DIM]) -> Self {
        FeatureVector(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    /// The three location indicator fields (Europe, Other, USA)
    pub fn location_indicators(&self) -> &[f32] {
        &self.0[LOCATION_OFFSET..GENRE_OFFSET]
    }

    /// The four genre indicator fields (RPG, Simulation, Sports, Strategy)
    pub fn genre_indicators(&self) -> &[f32] {
        &self.0[GENRE_OFFSET..Self::DIM]
    }
}

impl Index<usize> for FeatureVector {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

fn indicator(hit: bool) -> f32 {
    if hit {
        1.0
    } else {
        0.0
    }
}

pub fn encode_gender(gender: Gender) -> f32 {
    match gender {
        Gender::Male => 0.0,
        Gender::Female => 1.0,
    }
}

pub fn encode_difficulty(difficulty: GameDifficulty) -> f32 {
    match difficulty {
        GameDifficulty::Easy => 1.0,
        GameDifficulty::Medium => 2.0,
        GameDifficulty::Hard => 3.0,
    }
}

/// Encode a validated record into the model's feature layout
pub fn encode(attrs: &PlayerAttributes) -> FeatureVector {
    let location = attrs.location;
    let genre = attrs.game_genre;

    FeatureVector([
        attrs.age as f32,
        encode_gender(attrs.gender),
        attrs.play_time_hours,
        indicator(attrs.in_game_purchases),
        encode_difficulty(attrs.game_difficulty),
        attrs.sessions_per_week as f32,
        attrs.avg_session_duration_minutes as f32,
        attrs.player_level as f32,
        attrs.achievements_unlocked as f32,
        indicator(location == Location::Europe),
        indicator(location == Location::Other),
        indicator(location == Location::Usa),
        indicator(genre == GameGenre::Rpg),
        indicator(genre == GameGenre::Simulation),
        indicator(genre == GameGenre::Sports),
        indicator(genre == GameGenre::Strategy),
    ])
}

/// Validate and encode an untyped record
pub fn encode_raw(raw: &RawPlayerRecord) -> Result<FeatureVector> {
    let attrs = PlayerAttributes::try_from(raw)?;
    Ok(encode(&attrs))
}
