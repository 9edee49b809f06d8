//! Core domain types for the HYPE volume tracker.
//!
//! This crate provides the types shared by every stage of a collection run:
//! - `Metric`: a collected figure that is either available or explicitly unavailable
//! - `to_billions`: reference-unit volume to billions-of-fiat conversion
//! - `DailyRow`: one aggregated row of the output table, keyed by date
//! - `ComparatorSlot`: the three fixed comparator-exchange columns

pub mod error;
pub mod metric;
pub mod row;
pub mod volume;

pub use error::{CoreError, Result};
pub use metric::{FailurePolicy, Metric};
pub use row::{ComparatorSlot, DailyRow, COMPARATOR_COUNT, DATE_FORMAT};
pub use volume::{round_volume, to_billions, BILLION, VOLUME_DECIMALS};
