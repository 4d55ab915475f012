//! Bulk prediction over a CSV file
//!
//! Every input row is copied to the output with three extra columns. Rows
//! that fail validation keep their cells, get empty prediction cells and
//! carry the error message; the remaining rows are still predicted.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ByteRecord, StringRecord};
use serde::Serialize;

use crate::features::{encode_raw, ColumnIndex, FeatureVector};
use crate::{EngagementLevel, Result};

use super::Predictor;

pub const CLASS_COLUMN: &str = "PredictedClass";
pub const LEVEL_COLUMN: &str = "PredictedEngagementLevel";
pub const ERROR_COLUMN: &str = "PredictionError";

/// A row that could not be predicted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub message: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub predicted: usize,
    pub failed: usize,
    pub by_level: BTreeMap<EngagementLevel, usize>,
    pub errors: Vec<RowError>,
}

impl BatchSummary {
    fn record_error(&mut self, row: usize, message: String) {
        log::warn!("Row {}: {}", row, message);
        self.failed += 1;
        self.errors.push(RowError { row, message });
    }
}

/// Row held in memory between encoding and prediction
struct PendingRow {
    cells: StringRecord,
    encoded: std::result::Result<FeatureVector, String>,
}

/// Decode one row and encode it if it is well formed
///
/// Cells that are not valid UTF-8 are kept lossily. Cells beyond the header
/// width are dropped from the output and reported on the row.
fn read_row(index: &ColumnIndex, width: usize, bytes: ByteRecord) -> PendingRow {
    let (mut cells, utf8) = match StringRecord::from_byte_record(bytes) {
        Ok(cells) => (cells, true),
        Err(e) => (StringRecord::from_byte_record_lossy(e.into_byte_record()), false),
    };

    let mut problem = None;
    if cells.len() > width {
        let extra: Vec<&str> = cells.iter().skip(width).collect();
        problem = Some(format!(
            "row has {} fields but the header has {} (extra: {})",
            cells.len(),
            width,
            extra.join(",")
        ));
        cells.truncate(width);
    }
    if !utf8 {
        problem = Some("row is not valid UTF-8".to_string());
    }
    if let Some(message) = problem {
        return PendingRow {
            cells,
            encoded: Err(message),
        };
    }

    let encoded = encode_raw(&index.record(&cells)).map_err(|e| e.to_string());
    PendingRow { cells, encoded }
}

/// Predict every row of `input` and write the augmented CSV to `output`
///
/// A header lacking required columns fails with `SchemaMismatch` before
/// anything is written.
pub fn run_batch<R: Read, W: Write>(predictor: &Predictor, input: R, output: W) -> Result<BatchSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers()?.clone();
    let index = ColumnIndex::resolve(&headers)?;

    let mut pending = Vec::new();
    for result in reader.byte_records() {
        let row = match result {
            Ok(bytes) => read_row(&index, headers.len(), bytes),
            Err(e) => PendingRow {
                cells: StringRecord::new(),
                encoded: Err(format!("unreadable row: {}", e)),
            },
        };
        pending.push(row);
    }

    let valid: Vec<FeatureVector> = pending
        .iter()
        .filter_map(|r| r.encoded.as_ref().ok().copied())
        .collect();
    let mut predictions = predictor.predict_many(&valid)?.into_iter();

    let mut writer = csv::Writer::from_writer(output);
    let mut out_headers = headers.clone();
    out_headers.push_field(CLASS_COLUMN);
    out_headers.push_field(LEVEL_COLUMN);
    out_headers.push_field(ERROR_COLUMN);
    writer.write_record(&out_headers)?;

    let mut summary = BatchSummary::default();
    for (i, row) in pending.into_iter().enumerate() {
        summary.rows += 1;

        let mut out = row.cells;
        while out.len() < headers.len() {
            out.push_field("");
        }

        match row.encoded {
            Ok(_) => match predictions.next() {
                Some(pred) => {
                    out.push_field(&pred.class.to_string());
                    out.push_field(&pred.level.to_string());
                    out.push_field("");
                    summary.predicted += 1;
                    *summary.by_level.entry(pred.level).or_insert(0) += 1;
                }
                None => {
                    let message = "classifier returned too few predictions".to_string();
                    out.push_field("");
                    out.push_field("");
                    out.push_field(&message);
                    summary.record_error(i + 1, message);
                }
            },
            Err(message) => {
                out.push_field("");
                out.push_field("");
                out.push_field(&message);
                summary.record_error(i + 1, message);
            }
        }
        writer.write_record(&out)?;
    }
    writer.flush()?;

    log::info!(
        "Batch complete: {} rows, {} predicted, {} failed",
        summary.rows,
        summary.predicted,
        summary.failed
    );
    Ok(summary)
}

/// File-to-file wrapper around [`run_batch`]
pub fn run_batch_files(predictor: &Predictor, input: &Path, output: &Path) -> Result<BatchSummary> {
    let reader = std::fs::File::open(input)?;
    let mut buffer = Vec::new();
    let summary = run_batch(predictor, reader, &mut buffer)?;
    std::fs::write(output, buffer)?;
    Ok(summary)
}
