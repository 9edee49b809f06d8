//! Volume unit conversion.
//!
//! Exchange APIs report 24h volume in units of the reference asset (BTC).
//! The table stores fiat volume on a billions scale, rounded to 2 decimals.

use crate::error::{CoreError, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Divisor for the billions scale.
pub const BILLION: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Decimal places kept for stored volumes.
pub const VOLUME_DECIMALS: u32 = 2;

/// Convert a reference-unit volume to billions of fiat.
///
/// `round(volume_ref * reference_price / 1e9, 2)`
///
/// Fails with `CoreError::Overflow` when the product does not fit in a `Decimal`.
pub fn to_billions(volume_ref: Decimal, reference_price: Decimal) -> Result<Decimal> {
    volume_ref
        .checked_mul(reference_price)
        .and_then(|fiat| fiat.checked_div(BILLION))
        .map(round_volume)
        .ok_or_else(|| {
            CoreError::Overflow(format!(
                "volume conversion overflow: {volume_ref} * {reference_price}"
            ))
        })
}

/// Round a billions-scale volume to the stored precision.
///
/// Midpoints round to even.
#[inline]
pub fn round_volume(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(VOLUME_DECIMALS, RoundingStrategy::MidpointNearestEven);
    // Keep a fixed scale so 2 renders as "2.00"
    rounded.rescale(VOLUME_DECIMALS);
    rounded
}
