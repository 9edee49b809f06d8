//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Header mismatch: expected [{expected}], found [{found}]")]
    HeaderMismatch { expected: String, found: String },

    #[error("Invalid row at line {line}: {source}")]
    InvalidRow {
        line: u64,
        #[source]
        source: hvt_core::CoreError,
    },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
