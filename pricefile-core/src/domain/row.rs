//! OhlcvRow: the normalized unit of an ingested file.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::schema::FieldRole;

/// One timestamped OHLCV observation.
///
/// Prices are finite or missing. `low <= open, close <= high` is not
/// enforced here; the quality check reports violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvRow {
    pub timestamp: NaiveDateTime,
    pub open: Cell<f64>,
    pub high: Cell<f64>,
    pub low: Cell<f64>,
    pub close: Cell<f64>,
    pub volume: Cell<u64>,
    /// Extra numeric fields, aligned with `Schema::extra_fields()`.
    pub extra: Vec<Cell<f64>>,
}

impl OhlcvRow {
    /// Row with every value missing.
    pub fn empty(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            open: Cell::Missing,
            high: Cell::Missing,
            low: Cell::Missing,
            close: Cell::Missing,
            volume: Cell::Missing,
            extra: Vec::new(),
        }
    }

    /// Price cell for one of the four price roles.
    pub fn price(&self, role: FieldRole) -> Option<Cell<f64>> {
        match role {
            FieldRole::Open => Some(self.open),
            FieldRole::High => Some(self.high),
            FieldRole::Low => Some(self.low),
            FieldRole::Close => Some(self.close),
            FieldRole::Volume | FieldRole::Extra => None,
        }
    }

    pub fn set_price(&mut self, role: FieldRole, cell: Cell<f64>) {
        match role {
            FieldRole::Open => self.open = cell,
            FieldRole::High => self.high = cell,
            FieldRole::Low => self.low = cell,
            FieldRole::Close => self.close = cell,
            FieldRole::Volume | FieldRole::Extra => {}
        }
    }

    /// `Some(true)` when high >= low and open/close sit inside `[low, high]`.
    /// `None` when any price is missing.
    pub fn is_consistent(&self) -> Option<bool> {
        let open = self.open.value()?;
        let high = self.high.value()?;
        let low = self.low.value()?;
        let close = self.close.value()?;
        Some(high >= low && low <= open && open <= high && low <= close && close <= high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row() -> OhlcvRow {
        OhlcvRow {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            open: Cell::Value(100.0),
            high: Cell::Value(105.0),
            low: Cell::Value(98.0),
            close: Cell::Value(103.0),
            volume: Cell::Value(50_000),
            extra: Vec::new(),
        }
    }

    #[test]
    fn consistent_bar() {
        assert_eq!(sample_row().is_consistent(), Some(true));
    }

    #[test]
    fn inverted_high_low_is_inconsistent() {
        let mut row = sample_row();
        row.high = Cell::Value(97.0);
        assert_eq!(row.is_consistent(), Some(false));
    }

    #[test]
    fn missing_price_is_undecided() {
        let mut row = sample_row();
        row.low = Cell::Missing;
        assert_eq!(row.is_consistent(), None);
    }

    #[test]
    fn set_price_ignores_non_price_roles() {
        let mut row = sample_row();
        row.set_price(FieldRole::Close, Cell::Value(101.0));
        row.set_price(FieldRole::Volume, Cell::Value(1.0));
        assert_eq!(row.close, Cell::Value(101.0));
        assert_eq!(row.volume, Cell::Value(50_000));
    }
}
