//! Daily table persistence.
//!
//! Stores one row per calendar date in a CSV file with a fixed header.
//! The whole file is read at load and rewritten at persist.

pub mod error;
pub mod table;

pub use error::{PersistenceError, PersistenceResult};
pub use table::{DailyTable, MergeOutcome, TableSchema};
