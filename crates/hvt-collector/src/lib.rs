//! Daily HYPE volume collector.
//!
//! Fetches the reference (BTC) price, the HYPE mark price and venue volume,
//! and the comparator exchanges' volumes, converts volumes to billions of
//! USD, and merges one row per day into the CSV table.

pub mod collector;
pub mod config;
pub mod error;

pub use collector::{CollectedMetrics, CollectionReport, Collector};
pub use config::{AppConfig, ComparatorConfig, ExistingRowPolicy};
pub use error::{AppError, AppResult};
