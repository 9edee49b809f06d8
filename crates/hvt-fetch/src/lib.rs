//! Resilient HTTP fetching and market data endpoints.
//!
//! - `ResilientFetcher`: bounded retry with linear backoff on HTTP 429
//! - `Transport`: request seam, `ReqwestTransport` for real calls
//! - `MarketDataClient`: typed reads of the reference price, target token
//!   price and volume, and the comparator exchange listing

pub mod client;
pub mod error;
pub mod fetcher;
pub mod parse;
pub mod transport;

pub use client::{Endpoints, ExchangeListing, MarketDataClient};
pub use error::{FetchError, FetchResult};
pub use fetcher::{ResilientFetcher, RetryPolicy, Sleeper, ThreadSleeper};
pub use parse::decimal_from_json;
pub use transport::{HttpResponse, ReqwestTransport, Request, Transport};
