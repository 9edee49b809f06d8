//! Structured logging and run summaries.
//!
//! - `init_logging`: tracing subscriber setup (pretty or JSON)
//! - `RunSummary`: per-metric availability of one collection run

pub mod error;
pub mod logging;
pub mod summary;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use summary::{MetricSummary, RunSummary};
