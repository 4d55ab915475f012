//! Dataset loading and exploratory analysis

pub mod analysis;
pub mod dataset;

pub use analysis::DatasetReport;
pub use dataset::GamingDataset;
