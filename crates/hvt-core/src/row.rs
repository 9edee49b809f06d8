//! Aggregated daily row.

use crate::error::{CoreError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Number of comparator-exchange columns in a row.
pub const COMPARATOR_COUNT: usize = 3;

/// Date format used for the key column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Position of a comparator exchange in the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparatorSlot {
    A,
    B,
    C,
}

impl ComparatorSlot {
    pub const ALL: [ComparatorSlot; COMPARATOR_COUNT] = [Self::A, Self::B, Self::C];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
        }
    }
}

impl std::fmt::Display for ComparatorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
        }
    }
}

/// One row of the output table.
///
/// Volumes are billions of fiat (2 dp); `target_price` is the fiat mark price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub target_volume_b: Decimal,
    pub target_price: Decimal,
    pub comparator_volumes_b: [Decimal; COMPARATOR_COUNT],
}

impl DailyRow {
    /// Number of columns a row occupies.
    pub const WIDTH: usize = 3 + COMPARATOR_COUNT;

    /// Row with every figure zero.
    pub fn zeroed(date: NaiveDate) -> Self {
        Self {
            date,
            target_volume_b: Decimal::ZERO,
            target_price: Decimal::ZERO,
            comparator_volumes_b: [Decimal::ZERO; COMPARATOR_COUNT],
        }
    }

    #[inline]
    pub fn comparator(&self, slot: ComparatorSlot) -> Decimal {
        self.comparator_volumes_b[slot.index()]
    }

    /// Formatted date key.
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Render as table fields in column order.
    pub fn to_fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(Self::WIDTH);
        fields.push(self.date_key());
        fields.push(self.target_volume_b.to_string());
        fields.push(self.target_price.to_string());
        fields.extend(self.comparator_volumes_b.iter().map(Decimal::to_string));
        fields
    }

    /// Parse from table fields in column order.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self> {
        if fields.len() != Self::WIDTH {
            return Err(CoreError::ColumnCount {
                expected: Self::WIDTH,
                found: fields.len(),
            });
        }

        let raw_date = fields[0].as_ref().trim();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| CoreError::InvalidDate(format!("{raw_date}: {e}")))?;

        let mut comparator_volumes_b = [Decimal::ZERO; COMPARATOR_COUNT];
        for slot in ComparatorSlot::ALL {
            comparator_volumes_b[slot.index()] =
                parse_decimal("comparator_volume", fields[3 + slot.index()].as_ref())?;
        }

        Ok(Self {
            date,
            target_volume_b: parse_decimal("target_volume", fields[1].as_ref())?,
            target_price: parse_decimal("target_price", fields[2].as_ref())?,
            comparator_volumes_b,
        })
    }
}

fn parse_decimal(column: &'static str, raw: &str) -> Result<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| CoreError::InvalidDecimal {
            column,
            value: raw.to_string(),
        })
}
