//! HTTP transport.
//!
//! `Transport` performs exactly one request and reports the raw status and
//! body. Retry decisions belong to `ResilientFetcher`.

use crate::error::{FetchError, FetchResult};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("hvt-collector/", env!("CARGO_PKG_VERSION"));

/// A read-only request against a market data API.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Get { url: String },
    PostJson { url: String, body: serde_json::Value },
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self::Get { url: url.into() }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self::PostJson {
            url: url.into(),
            body,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Get { url } | Self::PostJson { url, .. } => url,
        }
    }
}

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// One-shot request execution.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Execute `request` once. `Err` means no HTTP response was received.
    fn execute(&self, request: &Request) -> FetchResult<HttpResponse>;
}

/// Blocking reqwest transport.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a per-request timeout.
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &Request) -> FetchResult<HttpResponse> {
        debug!(url = %request.url(), "Sending request");

        let builder = match request {
            Request::Get { url } => self.client.get(url),
            Request::PostJson { url, body } => self.client.post(url).json(body),
        };

        let response = builder
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| FetchError::Transport(format!("HTTP request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| FetchError::Transport(format!("Failed to read response body: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}
