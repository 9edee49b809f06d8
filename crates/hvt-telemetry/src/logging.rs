//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Default filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,hvt=debug";

/// Initialize logging to stdout.
///
/// JSON lines when `RUST_ENV=production` (for log shipping from cron),
/// pretty output otherwise. `RUST_LOG` overrides the filter.
pub fn init_logging() -> TelemetryResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(pretty_layer(std::io::stdout))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Multi-line development output with target and source location.
fn pretty_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer().pretty().with_target(true).with_writer(writer)
}
