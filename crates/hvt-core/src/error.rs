//! Error types for hvt-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid decimal in column {column}: {value}")]
    InvalidDecimal { column: &'static str, value: String },

    #[error("Expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },

    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    #[error("Metric unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
