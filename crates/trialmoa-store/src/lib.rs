//! Storage layer: on-disk result cache, drug input, and report writers.

pub mod cache;
mod error;
pub mod input;
pub mod report;

pub use cache::FileCache;
pub use error::StoreError;
pub use input::load_drugs;
pub use report::{ReportFormat, ReportPaths, read_parquet, write_report};
