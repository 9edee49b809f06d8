//! Response parsing for the market data endpoints.
//!
//! Every parser validates the shape it relies on and reports a
//! `FetchError::Shape` instead of guessing.

use crate::error::{FetchError, FetchResult};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Field carrying 24h volume in BTC on CoinGecko exchange objects.
pub const VOLUME_BTC_FIELD: &str = "trade_volume_24h_btc";

/// Convert a JSON number or numeric string to `Decimal`.
///
/// Accepts exponent notation (`"1.5e3"`). Returns `None` for anything else.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn decimal_field(object: &Value, field: &str, context: &str) -> FetchResult<Decimal> {
    let raw = object
        .get(field)
        .ok_or_else(|| FetchError::Shape(format!("{context}: missing field '{field}'")))?;
    decimal_from_json(raw)
        .ok_or_else(|| FetchError::Shape(format!("{context}: '{field}' is not numeric: {raw}")))
}

/// `simple/price` response: `{"bitcoin": {"usd": 64000.0}}`.
pub fn parse_simple_price(body: &Value, asset_id: &str, vs_currency: &str) -> FetchResult<Decimal> {
    let asset = body
        .get(asset_id)
        .ok_or_else(|| FetchError::MissingEntry(format!("simple/price has no '{asset_id}'")))?;
    decimal_field(asset, vs_currency, asset_id)
}

/// `metaAndAssetCtxs` response: `[{"universe": [...]}, [ctx, ...]]`.
///
/// `universe[i]` describes the asset whose context is `ctxs[i]`, so the two
/// lists must have the same length before any index is trusted.
pub fn parse_mark_price(body: &Value, coin: &str) -> FetchResult<Decimal> {
    let parts = body
        .as_array()
        .ok_or_else(|| FetchError::Shape("metaAndAssetCtxs response is not an array".to_string()))?;

    if parts.len() != 2 {
        return Err(FetchError::Shape(format!(
            "metaAndAssetCtxs response has {} elements, expected 2",
            parts.len()
        )));
    }

    let universe = parts[0]
        .get("universe")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Shape("meta has no 'universe' array".to_string()))?;

    let ctxs = parts[1]
        .as_array()
        .ok_or_else(|| FetchError::Shape("asset contexts are not an array".to_string()))?;

    if universe.len() != ctxs.len() {
        return Err(FetchError::Shape(format!(
            "universe has {} assets but {} asset contexts",
            universe.len(),
            ctxs.len()
        )));
    }

    let idx = universe
        .iter()
        .position(|asset| asset.get("name").and_then(Value::as_str) == Some(coin))
        .ok_or_else(|| FetchError::MissingEntry(format!("'{coin}' not in universe")))?;

    decimal_field(&ctxs[idx], "markPx", coin)
}

/// CoinGecko derivatives exchange detail: `{"name": ..., "trade_volume_24h_btc": "123.4", ...}`.
pub fn parse_derivatives_volume(body: &Value) -> FetchResult<Decimal> {
    if !body.is_object() {
        return Err(FetchError::Shape(
            "derivatives exchange response is not an object".to_string(),
        ));
    }
    decimal_field(body, VOLUME_BTC_FIELD, "derivatives exchange")
}
