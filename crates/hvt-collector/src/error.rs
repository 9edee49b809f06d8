//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] hvt_fetch::FetchError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] hvt_persistence::PersistenceError),

    #[error("Incomplete row: {0}")]
    Incomplete(#[from] hvt_core::CoreError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] hvt_telemetry::TelemetryError),
}

pub type AppResult<T> = Result<T, AppError>;
