//! Cell: a coerced numeric value or an explicit missing marker.
//!
//! Numeric cells never fail ingestion. Text that does not parse becomes
//! `Cell::Missing`, which is distinct from a parsed zero.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single numeric cell: either a value or missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell<T> {
    Value(T),
    Missing,
}

impl<T: Copy> Cell<T> {
    /// The value, if present.
    pub fn value(&self) -> Option<T> {
        match self {
            Cell::Value(v) => Some(*v),
            Cell::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl<T> Default for Cell<T> {
    fn default() -> Self {
        Cell::Missing
    }
}

impl<T> From<Option<T>> for Cell<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Cell::Value(v),
            None => Cell::Missing,
        }
    }
}

/// Missing renders as an empty string, which is also how it is written to CSV.
impl<T: fmt::Display> fmt::Display for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Value(v) => write!(f, "{v}"),
            Cell::Missing => Ok(()),
        }
    }
}

/// Coerce a price-like cell. Empty, unparseable and non-finite text is missing.
pub fn coerce_price(raw: &str) -> Cell<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        _ => Cell::Missing,
    }
}

/// Coerce a volume cell to a non-negative integer.
///
/// Accepts integral floats such as `1500.0`. Negative, fractional and
/// non-finite values are missing.
pub fn coerce_volume(raw: &str) -> Cell<u64> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<u64>() {
        return Cell::Value(v);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Cell::Value(v as u64)
        }
        _ => Cell::Missing,
    }
}
