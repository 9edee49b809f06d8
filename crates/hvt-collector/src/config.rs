//! Application configuration.

use crate::error::{AppError, AppResult};
use hvt_core::{FailurePolicy, COMPARATOR_COUNT};
use hvt_fetch::{Endpoints, RetryPolicy};
use hvt_persistence::TableSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config path used when neither `--config` nor `HVT_CONFIG` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// What to do when the table already has a row for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingRowPolicy {
    /// Delete the old row and append the fresh one.
    #[default]
    Replace,
    /// Keep the old row and skip fetching entirely.
    Skip,
}

/// Retry and timeout settings for every HTTP call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per call, including the first. Default: 3.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base backoff delay (ms). Default: 2000.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// 429 backoff is `base_delay_ms * (attempt + rate_limit_offset)`. Default: 1.
    #[serde(default = "default_rate_limit_offset")]
    pub rate_limit_offset: u32,
    /// Per-request timeout (ms). Default: 10000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_rate_limit_offset() -> u32 {
    1
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            rate_limit_offset: default_rate_limit_offset(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RetryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            base_delay: Duration::from_millis(cfg.base_delay_ms),
            rate_limit_offset: cfg.rate_limit_offset,
        }
    }
}

/// Reference asset price source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    #[serde(default = "default_reference_url")]
    pub url: String,
    /// Key of the asset in the price response.
    #[serde(default = "default_reference_asset_id")]
    pub asset_id: String,
    /// Fiat currency key in the price response.
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
}

fn default_reference_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd".to_string()
}

fn default_reference_asset_id() -> String {
    "bitcoin".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            url: default_reference_url(),
            asset_id: default_reference_asset_id(),
            vs_currency: default_vs_currency(),
        }
    }
}

/// Target token sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Coin name in the Hyperliquid perp universe.
    #[serde(default = "default_target_coin")]
    pub coin: String,
    /// Column label prefix.
    #[serde(default = "default_target_coin")]
    pub label: String,
    #[serde(default = "default_info_url")]
    pub info_url: String,
    /// Derivatives exchange detail reporting 24h volume in BTC.
    #[serde(default = "default_volume_url")]
    pub volume_url: String,
}

fn default_target_coin() -> String {
    "HYPE".to_string()
}

fn default_info_url() -> String {
    "https://api.hyperliquid.xyz/info".to_string()
}

fn default_volume_url() -> String {
    "https://api.coingecko.com/api/v3/derivatives/exchanges/hyperliquid".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            coin: default_target_coin(),
            label: default_target_coin(),
            info_url: default_info_url(),
            volume_url: default_volume_url(),
        }
    }
}

/// One comparator exchange column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// CoinGecko exchange id (Coinbase is "gdax").
    pub id: String,
    /// Column label prefix.
    pub label: String,
}

impl ComparatorConfig {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Comparator exchanges, all read from one listing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparatorsConfig {
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    /// Exactly three slots, in column order.
    #[serde(default = "default_slots")]
    pub slots: Vec<ComparatorConfig>,
}

fn default_listing_url() -> String {
    "https://api.coingecko.com/api/v3/exchanges?per_page=250".to_string()
}

fn default_slots() -> Vec<ComparatorConfig> {
    vec![
        ComparatorConfig::new("binance", "Binance"),
        ComparatorConfig::new("gdax", "Coinbase"),
        ComparatorConfig::new("upbit", "Upbit"),
    ]
}

impl Default for ComparatorsConfig {
    fn default() -> Self {
        Self {
            listing_url: default_listing_url(),
            slots: default_slots(),
        }
    }
}

fn default_output_path() -> String {
    "data/hype_volume.csv".to_string()
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// CSV table location.
    #[serde(default = "default_output_path")]
    pub output_path: String,
    /// Unavailable metrics: zero and write (best_effort) or abort (strict).
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Existing row for today: replace or skip.
    #[serde(default)]
    pub existing_row: ExistingRowPolicy,
    /// Compute and log the row without writing the table.
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub comparators: ComparatorsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            failure_policy: FailurePolicy::default(),
            existing_row: ExistingRowPolicy::default(),
            dry_run: false,
            retry: RetryConfig::default(),
            reference: ReferenceConfig::default(),
            target: TargetConfig::default(),
            comparators: ComparatorsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.comparators.slots.len() != COMPARATOR_COUNT {
            return Err(AppError::Config(format!(
                "comparators.slots must have exactly {COMPARATOR_COUNT} entries, found {}",
                self.comparators.slots.len()
            )));
        }
        if self.target.label.trim().is_empty()
            || self
                .comparators
                .slots
                .iter()
                .any(|s| s.id.trim().is_empty() || s.label.trim().is_empty())
        {
            return Err(AppError::Config(
                "target and comparator labels and ids must be non-empty".to_string(),
            ));
        }
        if self.output_path.trim().is_empty() {
            return Err(AppError::Config("output_path must be non-empty".to_string()));
        }
        Ok(())
    }

    /// Comparator slots in column order.
    pub fn comparator_slots(&self) -> AppResult<[ComparatorConfig; COMPARATOR_COUNT]> {
        <[ComparatorConfig; COMPARATOR_COUNT]>::try_from(self.comparators.slots.clone()).map_err(
            |slots| {
                AppError::Config(format!(
                    "comparators.slots must have exactly {COMPARATOR_COUNT} entries, found {}",
                    slots.len()
                ))
            },
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            reference_url: self.reference.url.clone(),
            reference_asset_id: self.reference.asset_id.clone(),
            vs_currency: self.reference.vs_currency.clone(),
            info_url: self.target.info_url.clone(),
            target_coin: self.target.coin.clone(),
            target_volume_url: self.target.volume_url.clone(),
            listing_url: self.comparators.listing_url.clone(),
        }
    }

    pub fn table_schema(&self) -> AppResult<TableSchema> {
        let slots = self.comparator_slots()?;
        let labels = slots.map(|s| s.label);
        Ok(TableSchema::new(&self.target.label, &labels))
    }
}
