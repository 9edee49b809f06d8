//! Bounded retry around a `Transport`.
//!
//! HTTP 429 backs off linearly: `base_delay * (attempt + rate_limit_offset)`
//! with a 0-based attempt index. Other failures wait `base_delay`.
//! A 200 response is parsed as JSON and returned without further attempts.

use crate::error::{FetchError, FetchResult};
use crate::transport::{ReqwestTransport, Request, Transport};
use std::time::Duration;
use tracing::{debug, warn};

const STATUS_OK: u16 = 200;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Default: 3.
    pub max_attempts: u32,
    /// Base delay between attempts. Default: 2s.
    pub base_delay: Duration,
    /// Added to the attempt index when scaling the rate-limit delay. Default: 1.
    pub rate_limit_offset: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            rate_limit_offset: 1,
        }
    }
}

impl RetryPolicy {
    /// Delay after a 429 on `attempt` (0-based).
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(attempt.saturating_add(self.rate_limit_offset))
    }

    /// Delay after any other failure.
    #[inline]
    pub fn failure_delay(&self) -> Duration {
        self.base_delay
    }
}

/// Blocking wait between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Suspends the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fetches JSON with bounded retries.
pub struct ResilientFetcher<T = ReqwestTransport, S = ThreadSleeper> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl<T: Transport, S: Sleeper> ResilientFetcher<T, S> {
    pub fn new(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch and parse `request`, retrying transient failures.
    ///
    /// Returns `FetchError::Exhausted` once every attempt has failed.
    /// A 200 whose body is not JSON fails immediately with `FetchError::Decode`.
    pub fn fetch(&self, request: &Request) -> FetchResult<serde_json::Value> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = FetchError::Transport("no attempt made".to_string());

        for attempt in 0..max_attempts {
            let (error, delay) = match self.transport.execute(request) {
                Ok(response) if response.status == STATUS_OK => {
                    debug!(url = %request.url(), attempt, "Request succeeded");
                    return serde_json::from_str(&response.body).map_err(|e| {
                        FetchError::Decode(format!("{}: {e}", request.url()))
                    });
                }
                Ok(response) if response.status == STATUS_TOO_MANY_REQUESTS => {
                    (FetchError::RateLimited, self.policy.rate_limit_delay(attempt))
                }
                Ok(response) => (
                    FetchError::Status {
                        status: response.status,
                        body: truncate(&response.body, 200),
                    },
                    self.policy.failure_delay(),
                ),
                Err(e) if e.is_transient() => (e, self.policy.failure_delay()),
                Err(e) => return Err(e),
            };

            let remaining = max_attempts - attempt - 1;
            warn!(
                url = %request.url(),
                attempt = attempt + 1,
                max_attempts,
                error = %error,
                "Request failed"
            );
            last_error = error;

            if remaining > 0 {
                debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                self.sleeper.sleep(delay);
            }
        }

        Err(FetchError::Exhausted {
            attempts: max_attempts,
            last: Box::new(last_error),
        })
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
