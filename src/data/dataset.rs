//! Gaming behaviour dataset loaded from CSV
//!
//! Column names differ between dataset exports (`GameGenre` vs `Game_Genre`,
//! etc.), so every lookup goes through the alias rules in
//! [`crate::features::record`].

use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::features::record::find_column;
use crate::{EngagementError, Result};

/// In-memory copy of a dataset file
#[derive(Debug, Clone)]
pub struct GamingDataset {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl GamingDataset {
    /// Load from a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            EngagementError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open dataset {}: {}", path.display(), e),
            ))
        })?;
        let dataset = Self::from_reader(file)?;
        log::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.len(),
            dataset.headers.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for result in reader.records() {
            match result {
                Ok(r) => records.push(r),
                Err(e) => {
                    skipped += 1;
                    log::debug!("Skipping unreadable dataset row: {}", e);
                }
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} unreadable dataset rows", skipped);
        }

        Ok(GamingDataset { headers, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    /// Header spelling used by this file for `name`
    pub fn resolve(&self, name: &str) -> Result<&str> {
        let idx = self.position(name)?;
        Ok(&self.headers[idx])
    }

    fn position(&self, name: &str) -> Result<usize> {
        find_column(&self.headers, name).ok_or_else(|| EngagementError::SchemaMismatch {
            missing: vec![name.to_string()],
        })
    }

    /// Trimmed text values of a column (empty string for short rows)
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.position(name)?;
        Ok(self
            .records
            .iter()
            .map(|r| r.get(idx).unwrap_or("").trim())
            .collect())
    }

    /// Numeric values of a column, aligned with rows; unparsable cells are None
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self
            .column(name)?
            .into_iter()
            .map(|v| v.parse::<f64>().ok().filter(|x| x.is_finite()))
            .collect())
    }

    /// `PlayerID`, `user_id`, `Id`
    fn is_identifier(header: &str) -> bool {
        let h = header.trim();
        h.eq_ignore_ascii_case("id")
            || h.ends_with("ID")
            || h.ends_with("Id")
            || h.to_ascii_lowercase().ends_with("_id")
    }

    fn is_numeric_column(&self, idx: usize) -> bool {
        let mut seen = false;
        for r in &self.records {
            let v = r.get(idx).unwrap_or("").trim();
            if v.is_empty() {
                continue;
            }
            if v.parse::<f64>().is_err() {
                return false;
            }
            seen = true;
        }
        seen
    }

    /// Columns whose non-empty cells all parse as numbers, identifiers excluded
    pub fn numeric_columns(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, h)| !Self::is_identifier(h) && self.is_numeric_column(*i))
            .map(|(_, h)| h.to_string())
            .collect()
    }

    /// Non-numeric, non-identifier columns
    pub fn categorical_columns(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, h)| !Self::is_identifier(h) && !self.is_numeric_column(*i))
            .map(|(_, h)| h.to_string())
            .collect()
    }
}
