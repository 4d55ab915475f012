//! Untyped player records and dataset column names
//!
//! Form input, JSON and CSV rows all arrive as strings. Conversion into
//! [`PlayerAttributes`] is the single place where categories and bounds are
//! checked.

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::{EngagementError, PlayerAttributes, Result};

/// Bounds enforced by the input form
pub const MIN_AGE: u32 = 15;
pub const MAX_AGE: u32 = 49;

/// Raw attribute columns required to build a record, in canonical spelling
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "Age",
    "Gender",
    "Location",
    "GameGenre",
    "PlayTimeHours",
    "InGamePurchases",
    "GameDifficulty",
    "SessionsPerWeek",
    "AvgSessionDurationMinutes",
    "PlayerLevel",
    "AchievementsUnlocked",
];

/// Short spellings seen in dataset variants
const EXTRA_ALIASES: [(&str, &str); 6] = [
    ("genre", "GameGenre"),
    ("playtime", "PlayTimeHours"),
    ("difficulty", "GameDifficulty"),
    ("avgsessionduration", "AvgSessionDurationMinutes"),
    ("achievements", "AchievementsUnlocked"),
    ("engagement", "EngagementLevel"),
];

/// Comparison key for column names: lowercase, separators dropped
fn column_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// True when `header` is a spelling of the canonical column `canonical`
///
/// `Game_Genre`, `gamegenre` and `Genre` all name `GameGenre`.
pub fn column_matches(header: &str, canonical: &str) -> bool {
    let key = column_key(header);
    if key == column_key(canonical) {
        return true;
    }
    EXTRA_ALIASES
        .iter()
        .any(|(alias, target)| *alias == key && *target == canonical)
}

/// Position of `canonical` among `headers`, resolving aliases
pub fn find_column(headers: &StringRecord, canonical: &str) -> Option<usize> {
    headers.iter().position(|h| column_matches(h, canonical))
}

/// Positions of the required columns within a CSV header row
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnIndex {
    /// Resolve every required column, or report all that are missing
    pub fn resolve(headers: &StringRecord) -> Result<Self> {
        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();

        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            match find_column(headers, name) {
                Some(idx) => *slot = idx,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(EngagementError::SchemaMismatch { missing });
        }
        Ok(ColumnIndex { positions })
    }

    fn cell<'a>(&self, row: &'a StringRecord, column: usize) -> &'a str {
        row.get(self.positions[column]).unwrap_or("")
    }

    /// Extract the raw attribute cells from a data row
    pub fn record(&self, row: &StringRecord) -> RawPlayerRecord {
        RawPlayerRecord {
            age: self.cell(row, 0).to_string(),
            gender: self.cell(row, 1).to_string(),
            location: self.cell(row, 2).to_string(),
            game_genre: self.cell(row, 3).to_string(),
            play_time_hours: self.cell(row, 4).to_string(),
            in_game_purchases: self.cell(row, 5).to_string(),
            game_difficulty: self.cell(row, 6).to_string(),
            sessions_per_week: self.cell(row, 7).to_string(),
            avg_session_duration_minutes: self.cell(row, 8).to_string(),
            player_level: self.cell(row, 9).to_string(),
            achievements_unlocked: self.cell(row, 10).to_string(),
        }
    }
}

/// A player record as submitted, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPlayerRecord {
    pub age: String,
    pub gender: String,
    pub location: String,
    pub game_genre: String,
    pub play_time_hours: String,
    pub in_game_purchases: String,
    pub game_difficulty: String,
    pub sessions_per_week: String,
    pub avg_session_duration_minutes: String,
    pub player_level: String,
    pub achievements_unlocked: String,
}

fn parse_count(field: &'static str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| EngagementError::invalid(field, value))
}

fn parse_age(value: &str) -> Result<u32> {
    let age = parse_count("Age", value)?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(EngagementError::invalid("Age", value));
    }
    Ok(age)
}

fn parse_hours(value: &str) -> Result<f32> {
    match value.trim().parse::<f32>() {
        Ok(h) if h.is_finite() && h >= 0.0 => Ok(h),
        _ => Err(EngagementError::invalid("PlayTimeHours", value)),
    }
}

fn parse_purchases(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "1" => Ok(true),
        "no" | "0" => Ok(false),
        _ => Err(EngagementError::invalid("InGamePurchases", value)),
    }
}

impl TryFrom<&RawPlayerRecord> for PlayerAttributes {
    type Error = EngagementError;

    fn try_from(raw: &RawPlayerRecord) -> Result<Self> {
        Ok(PlayerAttributes {
            age: parse_age(&raw.age)?,
            gender: raw.gender.parse()?,
            location: raw.location.parse()?,
            game_genre: raw.game_genre.parse()?,
            play_time_hours: parse_hours(&raw.play_time_hours)?,
            in_game_purchases: parse_purchases(&raw.in_game_purchases)?,
            game_difficulty: raw.game_difficulty.parse()?,
            sessions_per_week: parse_count("SessionsPerWeek", &raw.sessions_per_week)?,
            avg_session_duration_minutes: parse_count(
                "AvgSessionDurationMinutes",
                &raw.avg_session_duration_minutes,
            )?,
            player_level: parse_count("PlayerLevel", &raw.player_level)?,
            achievements_unlocked: parse_count("AchievementsUnlocked", &raw.achievements_unlocked)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameDifficulty, GameGenre, Gender, Location};

    fn raw() -> RawPlayerRecord {
        RawPlayerRecord {
            age: "25".into(),
            gender: "Female".into(),
            location: "USA".into(),
            game_genre: "Sports".into(),
            play_time_hours: "12.25".into(),
            in_game_purchases: "No".into(),
            game_difficulty: "Medium".into(),
            sessions_per_week: "4".into(),
            avg_session_duration_minutes: "90".into(),
            player_level: "33".into(),
            achievements_unlocked: "12".into(),
        }
    }

    #[test]
    fn test_valid_record_converts() {
        let attrs = PlayerAttributes::try_from(&raw()).unwrap();
        assert_eq!(attrs.gender, Gender::Female);
        assert_eq!(attrs.location, Location::Usa);
        assert_eq!(attrs.game_genre, GameGenre::Sports);
        assert_eq!(attrs.game_difficulty, GameDifficulty::Medium);
        assert!(!attrs.in_game_purchases);
        assert_eq!(attrs.play_time_hours, 12.25);
    }

    #[test]
    fn test_numeric_purchase_flag() {
        let mut r = raw();
        r.in_game_purchases = "1".into();
        assert!(PlayerAttributes::try_from(&r).unwrap().in_game_purchases);
        r.in_game_purchases = "maybe".into();
        assert!(PlayerAttributes::try_from(&r).is_err());
    }

    #[test]
    fn test_age_bounds() {
        let mut r = raw();
        r.age = "14".into();
        assert!(matches!(
            PlayerAttributes::try_from(&r),
            Err(EngagementError::InvalidAttribute { field: "Age", .. })
        ));
        r.age = "49".into();
        assert!(PlayerAttributes::try_from(&r).is_ok());
        r.age = "50".into();
        assert!(PlayerAttributes::try_from(&r).is_err());
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut r = raw();
        r.play_time_hours = "-1".into();
        assert!(PlayerAttributes::try_from(&r).is_err());

        let mut r = raw();
        r.sessions_per_week = "-3".into();
        assert!(matches!(
            PlayerAttributes::try_from(&r),
            Err(EngagementError::InvalidAttribute { field: "SessionsPerWeek", .. })
        ));
    }

    #[test]
    fn test_column_aliases() {
        assert!(column_matches("Game_Genre", "GameGenre"));
        assert!(column_matches("gamegenre", "GameGenre"));
        assert!(column_matches("Genre", "GameGenre"));
        assert!(column_matches("Engagement_Level", "EngagementLevel"));
        assert!(!column_matches("Genre", "Gender"));
    }

    #[test]
    fn test_resolve_reports_all_missing() {
        let headers = StringRecord::from(vec!["PlayerID", "Age", "Gender", "Location", "Game_Genre"]);
        match ColumnIndex::resolve(&headers) {
            Err(EngagementError::SchemaMismatch { missing }) => {
                assert_eq!(missing.len(), 7);
                assert!(missing.contains(&"PlayTimeHours".to_string()));
                assert!(!missing.contains(&"GameGenre".to_string()));
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_record_extraction_follows_header_order() {
        let headers = StringRecord::from(vec![
            "AchievementsUnlocked",
            "PlayerLevel",
            "AvgSessionDurationMinutes",
            "SessionsPerWeek",
            "GameDifficulty",
            "InGamePurchases",
            "PlayTimeHours",
            "GameGenre",
            "Location",
            "Gender",
            "Age",
        ]);
        let row = StringRecord::from(vec!["5", "20", "45", "10", "Hard", "1", "3.5", "RPG", "Europe", "Male", "25"]);
        let index = ColumnIndex::resolve(&headers).unwrap();
        let rec = index.record(&row);
        assert_eq!(rec.age, "25");
        assert_eq!(rec.achievements_unlocked, "5");
        assert_eq!(rec.game_genre, "RPG");
    }
}
