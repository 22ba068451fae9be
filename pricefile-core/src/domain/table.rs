//! OhlcvTable: rows in file order plus the resolved schema.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::row::OhlcvRow;
use super::schema::Schema;
use crate::fingerprint::{fingerprint_table, TableFingerprint};

/// An ingested table. Rows keep their source order; the timestamp is the
/// ordering key but is not required to be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvTable {
    schema: Schema,
    rows: Vec<OhlcvRow>,
}

impl OhlcvTable {
    pub fn new(schema: Schema, rows: Vec<OhlcvRow>) -> Self {
        Self { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[OhlcvRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<OhlcvRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows in table order.
    pub fn head(&self, n: usize) -> &[OhlcvRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Earliest and latest timestamp, regardless of row order.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.rows.iter().map(|r| r.timestamp).min()?;
        let max = self.rows.iter().map(|r| r.timestamp).max()?;
        Some((min, max))
    }

    /// Stable sort by timestamp. The table never reorders on its own.
    pub fn sort_by_timestamp(&mut self) {
        self.rows.sort_by_key(|r| r.timestamp);
    }

    /// Extra field `name` of row `row`.
    pub fn extra(&self, row: usize, name: &str) -> Option<Cell<f64>> {
        let pos = self.schema.extra_position(name)?;
        self.rows.get(row)?.extra.get(pos).copied()
    }

    pub fn summary(&self) -> TableSummary {
        let range = self.time_range();
        TableSummary {
            rows: self.rows.len(),
            start: range.map(|(s, _)| s),
            end: range.map(|(_, e)| e),
            fields: self.schema.names().into_iter().map(String::from).collect(),
        }
    }

    pub fn fingerprint(&self) -> TableFingerprint {
        fingerprint_table(self)
    }
}

/// Record count, date range and field list of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub rows: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn row(t: NaiveDateTime, close: f64, ma: f64) -> OhlcvRow {
        let mut r = OhlcvRow::empty(t);
        r.close = Cell::Value(close);
        r.extra = vec![Cell::Value(ma)];
        r
    }

    fn table() -> OhlcvTable {
        let schema = Schema::from_columns("DateTime", ["Close", "MA5"]);
        OhlcvTable::new(
            schema,
            vec![
                row(ts(9, 45), 3.0, 30.0),
                row(ts(9, 30), 1.0, 10.0),
                row(ts(9, 30), 2.0, 20.0),
            ],
        )
    }

    #[test]
    fn time_range_ignores_order() {
        assert_eq!(table().time_range(), Some((ts(9, 30), ts(9, 45))));
    }

    #[test]
    fn sort_is_stable_and_explicit() {
        let mut t = table();
        assert_eq!(t.rows()[0].timestamp, ts(9, 45));
        t.sort_by_timestamp();
        let closes: Vec<_> = t.rows().iter().map(|r| r.close.value().unwrap()).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn extra_lookup_by_name() {
        let t = table();
        assert_eq!(t.extra(1, "MA5"), Some(Cell::Value(10.0)));
        assert_eq!(t.extra(1, "MA50"), None);
        assert_eq!(t.extra(9, "MA5"), None);
    }

    #[test]
    fn summary_reports_rows_and_range() {
        let s = table().summary();
        assert_eq!(s.rows, 3);
        assert_eq!(s.start, Some(ts(9, 30)));
        assert_eq!(s.end, Some(ts(9, 45)));
        assert_eq!(s.fields, vec!["DateTime", "Close", "MA5"]);
    }

    #[test]
    fn head_clamps() {
        assert_eq!(table().head(10).len(), 3);
        assert_eq!(table().head(1).len(), 1);
    }
}
