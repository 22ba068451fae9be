//! Calendar resampling of OHLCV rows into coarser buckets.
//!
//! Per bucket, in chronological order: open = first, high = max, low = min,
//! close = last, volume = sum. Missing cells are skipped; a bucket where a
//! field is missing in every row keeps it missing. Empty buckets are not
//! emitted.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{Cell, FieldRole, OhlcvRow, OhlcvTable, Schema};

/// Bucket size. Buckets are aligned to the Unix epoch, so days start at
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Minutes(u32),
    Hours(u32),
    Days(u32),
}

impl Frequency {
    pub const DAILY: Frequency = Frequency::Days(1);

    pub fn step_seconds(self) -> i64 {
        match self {
            Frequency::Minutes(n) => i64::from(n) * 60,
            Frequency::Hours(n) => i64::from(n) * 3_600,
            Frequency::Days(n) => i64::from(n) * 86_400,
        }
    }

    /// Start of the bucket containing `ts`.
    pub fn bucket_start(self, ts: NaiveDateTime) -> NaiveDateTime {
        let secs = ts.and_utc().timestamp();
        let floored = secs - secs.rem_euclid(self.step_seconds().max(1));
        DateTime::from_timestamp(floored, 0)
            .map(|d| d.naive_utc())
            .unwrap_or(ts)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Minutes(n) => write!(f, "{n}min"),
            Frequency::Hours(n) => write!(f, "{n}h"),
            Frequency::Days(n) => write!(f, "{n}D"),
        }
    }
}

/// Rule strings in the pandas style: `1min`, `5T`, `15m`, `1h`, `H`, `1D`, `D`.
impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);
        let n: u32 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| FrequencyError::Invalid(s.to_string()))?
        };
        if n == 0 {
            return Err(FrequencyError::Zero);
        }
        match unit.to_ascii_lowercase().as_str() {
            "min" | "t" | "m" => Ok(Frequency::Minutes(n)),
            "h" | "hour" => Ok(Frequency::Hours(n)),
            "d" | "day" => Ok(Frequency::Days(n)),
            _ => Err(FrequencyError::Invalid(s.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrequencyError {
    #[error("invalid frequency '{0}' (expected e.g. 1min, 5T, 1h, 1D)")]
    Invalid(String),

    #[error("frequency must be at least one unit")]
    Zero,
}

#[derive(Debug, Default)]
struct Bucket {
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<u64>,
}

impl Bucket {
    fn push(&mut self, row: &OhlcvRow) {
        if self.open.is_none() {
            self.open = row.open.value();
        }
        if let Some(h) = row.high.value() {
            self.high = Some(self.high.map_or(h, |cur| cur.max(h)));
        }
        if let Some(l) = row.low.value() {
            self.low = Some(self.low.map_or(l, |cur| cur.min(l)));
        }
        if let Some(c) = row.close.value() {
            self.close = Some(c);
        }
        if let Some(v) = row.volume.value() {
            self.volume = Some(self.volume.map_or(v, |cur| cur.saturating_add(v)));
        }
    }

    fn finish(self, start: NaiveDateTime) -> OhlcvRow {
        OhlcvRow {
            timestamp: start,
            open: Cell::from(self.open),
            high: Cell::from(self.high),
            low: Cell::from(self.low),
            close: Cell::from(self.close),
            volume: Cell::from(self.volume),
            extra: Vec::new(),
        }
    }
}

/// Aggregate `table` into `freq` buckets. The input table is not modified.
///
/// Output rows are in ascending bucket order; the schema keeps the index
/// name and the OHLCV columns present in the input. Extras are dropped.
pub fn resample(table: &OhlcvTable, freq: Frequency) -> OhlcvTable {
    let mut ordered: Vec<&OhlcvRow> = table.rows().iter().collect();
    ordered.sort_by_key(|r| r.timestamp);

    let mut buckets: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();
    for row in ordered {
        buckets
            .entry(freq.bucket_start(row.timestamp))
            .or_default()
            .push(row);
    }

    let schema = table.schema();
    let columns = FieldRole::PRICES
        .iter()
        .chain(std::iter::once(&FieldRole::Volume))
        .filter_map(|&role| schema.name_of(role).map(String::from));
    let out_schema = Schema::from_columns(schema.index_name(), columns);

    let rows = buckets
        .into_iter()
        .map(|(start, bucket)| bucket.finish(start))
        .collect();
    OhlcvTable::new(out_schema, rows)
}
