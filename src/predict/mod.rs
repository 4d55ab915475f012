//! Prediction and inference
//!
//! Load trained artifacts and generate predictions for single records or
//! whole CSV files.

pub mod batch;
pub mod inference;

pub use batch::{run_batch, BatchSummary};
pub use inference::Predictor;
