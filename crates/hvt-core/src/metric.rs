//! Per-metric availability.
//!
//! Every figure a run collects is a `Metric`. A fetch failure is carried as
//! `Unavailable` with its reason instead of being collapsed into zero at the
//! call site; the zero substitution happens once, when a row is rendered,
//! under the run's `FailurePolicy`.

use crate::error::{CoreError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A collected value or the reason it could not be collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metric {
    Available(Decimal),
    Unavailable(String),
}

impl Metric {
    /// Build an unavailable metric from any displayable reason.
    pub fn unavailable(reason: impl fmt::Display) -> Self {
        Self::Unavailable(reason.to_string())
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    #[inline]
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Self::Available(v) => Some(*v),
            Self::Unavailable(_) => None,
        }
    }

    /// Stored value for best-effort rows.
    #[inline]
    pub fn value_or_zero(&self) -> Decimal {
        self.value().unwrap_or(Decimal::ZERO)
    }

    /// Apply `f` to an available value.
    pub fn map(self, f: impl FnOnce(Decimal) -> Decimal) -> Self {
        match self {
            Self::Available(v) => Self::Available(f(v)),
            other => other,
        }
    }

    /// Apply a fallible `f` to an available value; an error makes it unavailable.
    pub fn and_then<E: fmt::Display>(
        self,
        f: impl FnOnce(Decimal) -> std::result::Result<Decimal, E>,
    ) -> Self {
        match self {
            Self::Available(v) => Self::from(f(v)),
            other => other,
        }
    }

    /// Resolve to a stored number under `policy`.
    pub fn resolve(&self, policy: FailurePolicy, name: &str) -> Result<Decimal> {
        match (self, policy) {
            (Self::Unavailable(reason), FailurePolicy::Strict) => {
                Err(CoreError::Unavailable(format!("{name}: {reason}")))
            }
            _ => Ok(self.value_or_zero()),
        }
    }
}

impl<E: fmt::Display> From<std::result::Result<Decimal, E>> for Metric {
    fn from(result: std::result::Result<Decimal, E>) -> Self {
        match result {
            Ok(v) => Self::Available(v),
            Err(e) => Self::unavailable(e),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(v) => write!(f, "{v}"),
            Self::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

/// What to do with unavailable metrics when rendering a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Store zero and always write the row.
    #[default]
    BestEffort,
    /// Abort the run; the table is left untouched.
    Strict,
}
