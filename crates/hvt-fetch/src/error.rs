//! Fetch error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Rate limited (HTTP 429)")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Entry not found: {0}")]
    MissingEntry(String),

    #[error("Gave up after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Whether the fetcher should try again after this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited | Self::Status { .. }
        )
    }
}

pub type FetchResult<T> = Result<T, FetchError>;
