//! Market data client.
//!
//! One typed read per collected figure. Each read goes through the
//! `ResilientFetcher` and returns its own `Result`, so a failure in one never
//! prevents another from being attempted.

use crate::error::{FetchError, FetchResult};
use crate::fetcher::{ResilientFetcher, RetryPolicy, Sleeper, ThreadSleeper};
use crate::parse::{
    decimal_from_json, parse_derivatives_volume, parse_mark_price, parse_simple_price,
    VOLUME_BTC_FIELD,
};
use crate::transport::{ReqwestTransport, Request, Transport};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Reference asset price URL (CoinGecko `simple/price`).
    pub reference_url: String,
    /// Reference asset id in the price response (e.g., "bitcoin").
    pub reference_asset_id: String,
    /// Fiat currency key in the price response (e.g., "usd").
    pub vs_currency: String,
    /// Hyperliquid info endpoint.
    pub info_url: String,
    /// Target coin name in the perp universe (e.g., "HYPE").
    pub target_coin: String,
    /// Derivatives exchange detail URL reporting the target's 24h volume in BTC.
    pub target_volume_url: String,
    /// Exchange listing URL reporting every venue's 24h volume in BTC.
    pub listing_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            reference_url:
                "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd"
                    .to_string(),
            reference_asset_id: "bitcoin".to_string(),
            vs_currency: "usd".to_string(),
            info_url: "https://api.hyperliquid.xyz/info".to_string(),
            target_coin: "HYPE".to_string(),
            target_volume_url: "https://api.coingecko.com/api/v3/derivatives/exchanges/hyperliquid"
                .to_string(),
            listing_url: "https://api.coingecko.com/api/v3/exchanges?per_page=250".to_string(),
        }
    }
}

/// Exchange listing keyed by CoinGecko exchange id.
#[derive(Debug, Clone, Default)]
pub struct ExchangeListing {
    entries: HashMap<String, Value>,
}

impl ExchangeListing {
    /// Build from the listing response (array of exchange objects).
    pub fn from_json(body: &Value) -> FetchResult<Self> {
        let items = body
            .as_array()
            .ok_or_else(|| FetchError::Shape("exchange listing is not an array".to_string()))?;

        let mut entries = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            match item.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() => {
                    entries.insert(id.to_string(), item.clone());
                }
                _ => debug!(idx, "Skipping listing entry without id"),
            }
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 24h volume of exchange `id` in BTC.
    pub fn volume_ref(&self, id: &str) -> FetchResult<Decimal> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| FetchError::MissingEntry(format!("exchange '{id}' not in listing")))?;

        let raw = entry.get(VOLUME_BTC_FIELD).ok_or_else(|| {
            FetchError::Shape(format!("exchange '{id}': missing field '{VOLUME_BTC_FIELD}'"))
        })?;

        decimal_from_json(raw).ok_or_else(|| {
            FetchError::Shape(format!("exchange '{id}': '{VOLUME_BTC_FIELD}' is not numeric: {raw}"))
        })
    }
}

/// Client for the reference, target, and comparator endpoints.
pub struct MarketDataClient<T = ReqwestTransport, S = ThreadSleeper> {
    fetcher: ResilientFetcher<T, S>,
    endpoints: Endpoints,
}

impl MarketDataClient {
    /// Create a client backed by a blocking reqwest transport.
    pub fn new(
        endpoints: Endpoints,
        policy: RetryPolicy,
        request_timeout: Duration,
    ) -> FetchResult<Self> {
        let transport = ReqwestTransport::new(request_timeout)?;
        Ok(Self::with_fetcher(
            ResilientFetcher::new(transport, ThreadSleeper, policy),
            endpoints,
        ))
    }
}

impl<T: Transport, S: Sleeper> MarketDataClient<T, S> {
    pub fn with_fetcher(fetcher: ResilientFetcher<T, S>, endpoints: Endpoints) -> Self {
        Self { fetcher, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fiat price of the reference asset.
    pub fn reference_price(&self) -> FetchResult<Decimal> {
        info!(url = %self.endpoints.reference_url, "Fetching reference price");
        let body = self
            .fetcher
            .fetch(&Request::get(&self.endpoints.reference_url))?;
        let price = parse_simple_price(
            &body,
            &self.endpoints.reference_asset_id,
            &self.endpoints.vs_currency,
        )?;
        info!(asset = %self.endpoints.reference_asset_id, %price, "Fetched reference price");
        Ok(price)
    }

    /// Mark price of the target coin from `metaAndAssetCtxs`.
    pub fn target_mark_price(&self) -> FetchResult<Decimal> {
        info!(
            url = %self.endpoints.info_url,
            coin = %self.endpoints.target_coin,
            "Fetching target mark price"
        );
        let request = Request::post_json(
            &self.endpoints.info_url,
            json!({ "type": "metaAndAssetCtxs" }),
        );
        let body = self.fetcher.fetch(&request)?;
        let price = parse_mark_price(&body, &self.endpoints.target_coin)?;
        info!(coin = %self.endpoints.target_coin, %price, "Fetched target mark price");
        Ok(price)
    }

    /// 24h volume of the target venue, in reference-asset units.
    pub fn target_volume_ref(&self) -> FetchResult<Decimal> {
        info!(url = %self.endpoints.target_volume_url, "Fetching target volume");
        let body = self
            .fetcher
            .fetch(&Request::get(&self.endpoints.target_volume_url))?;
        let volume = parse_derivatives_volume(&body)?;
        debug!(%volume, "Fetched target volume (reference units)");
        Ok(volume)
    }

    /// Exchange listing used for every comparator.
    pub fn exchange_listing(&self) -> FetchResult<ExchangeListing> {
        info!(url = %self.endpoints.listing_url, "Fetching exchange listing");
        let body = self
            .fetcher
            .fetch(&Request::get(&self.endpoints.listing_url))?;
        let listing = ExchangeListing::from_json(&body)?;
        if listing.is_empty() {
            warn!("Exchange listing is empty");
        }
        info!(exchanges = listing.len(), "Fetched exchange listing");
        Ok(listing)
    }
}
