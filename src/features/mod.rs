//! Feature extraction and encoding
//!
//! Converts raw player records into model-ready feature vectors.

pub mod encoding;
pub mod record;

pub use encoding::{encode, encode_raw, FeatureVector, FEATURE_NAMES};
pub use record::{ColumnIndex, RawPlayerRecord, REQUIRED_COLUMNS};
