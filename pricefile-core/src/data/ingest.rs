//! The ingester: path (+ optional hint) → normalized `OhlcvTable`.
//!
//! Steps:
//! 1. Read the file (nothing is parsed when the path does not exist).
//! 2. Pick a layout: the hinted strategy, or the first detection strategy
//!    that accepts.
//! 3. Resolve the timestamp source (hint, `Date` + `Time`, a named
//!    date-time column, or the first non-price column).
//! 4. Parse timestamps under a single inferred format, all or nothing.
//! 5. Coerce every other column cell by cell; bad cells become missing.
//!
//! The ingester keeps no state between calls.

use std::path::Path;

use csv::StringRecord;
use tracing::{debug, trace};

use super::error::IngestError;
use super::hint::{DateTimeLayout, LayoutHint};
use super::strategy::{Attempt, ParseStrategy, RawTable};
use super::timestamp;
use crate::domain::{coerce_price, coerce_volume, FieldRole, OhlcvRow, OhlcvTable, Schema};

/// Name of the index field derived from separate `Date` and `Time` columns.
pub const DERIVED_INDEX_NAME: &str = "DateTime";

/// Single-column timestamp names, in priority order.
const TIMESTAMP_COLUMN_NAMES: [&str; 5] = ["datetime", "timestamp", "date_time", "date", "time"];

/// Ingest a price file.
pub fn ingest(path: &Path, hint: Option<&LayoutHint>) -> Result<OhlcvTable, IngestError> {
    match std::fs::metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(IngestError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "read price file");
    ingest_str(&text, hint)
}

/// Ingest price data already in memory.
pub fn ingest_str(text: &str, hint: Option<&LayoutHint>) -> Result<OhlcvTable, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }

    let raw = match hint.filter(|h| h.pins_structure()) {
        Some(h) => ParseStrategy::from_hint(h)?.split(text)?,
        None => detect_layout(text)?,
    };
    debug!(
        strategy = %raw.strategy,
        columns = raw.columns.len(),
        records = raw.records.len(),
        "layout resolved"
    );

    normalize(raw, hint)
}

/// Try the detection strategies in order; first acceptance wins.
pub fn detect_layout(text: &str) -> Result<RawTable, IngestError> {
    for strategy in ParseStrategy::detection_order() {
        match strategy.attempt(text)? {
            Attempt::Accepted(raw) => return Ok(raw),
            Attempt::Rejected(reason) => {
                trace!(strategy = %strategy.name, %reason, "layout rejected");
            }
        }
    }
    Err(IngestError::UnrecognizedFormat)
}

/// Where timestamps are read from, by column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimestampSource {
    Single(usize),
    Split { date: usize, time: usize },
}

impl TimestampSource {
    fn consumes(self, index: usize) -> bool {
        match self {
            TimestampSource::Single(i) => i == index,
            TimestampSource::Split { date, time } => date == index || time == index,
        }
    }

    fn value(self, record: &StringRecord) -> String {
        match self {
            TimestampSource::Single(i) => record.get(i).unwrap_or("").trim().to_string(),
            TimestampSource::Split { date, time } => format!(
                "{} {}",
                record.get(date).unwrap_or("").trim(),
                record.get(time).unwrap_or("").trim()
            ),
        }
    }
}

fn normalize(raw: RawTable, hint: Option<&LayoutHint>) -> Result<OhlcvTable, IngestError> {
    if raw.records.is_empty() {
        return Err(IngestError::Empty);
    }

    let source = resolve_timestamp_source(&raw.columns, hint.and_then(|h| h.datetime.as_ref()))?;
    let index_name = match source {
        TimestampSource::Single(i) => raw.columns[i].clone(),
        TimestampSource::Split { .. } => DERIVED_INDEX_NAME.to_string(),
    };

    let stamps: Vec<String> = raw.records.iter().map(|r| source.value(r)).collect();
    let timestamps = timestamp::parse_column(
        &stamps,
        hint.and_then(|h| h.timestamp_format.as_deref()),
    )?;

    // Source column index of every non-index field, in schema order.
    let value_columns: Vec<usize> = (0..raw.columns.len())
        .filter(|&i| !source.consumes(i))
        .collect();
    let schema = Schema::from_columns(
        index_name,
        value_columns.iter().map(|&i| raw.columns[i].clone()),
    );

    let rows = raw
        .records
        .iter()
        .zip(timestamps)
        .map(|(record, ts)| build_row(&schema, &value_columns, record, ts))
        .collect::<Vec<_>>();

    debug!(rows = rows.len(), fields = schema.fields().len(), "table normalized");
    Ok(OhlcvTable::new(schema, rows))
}

fn build_row(
    schema: &Schema,
    value_columns: &[usize],
    record: &StringRecord,
    timestamp: chrono::NaiveDateTime,
) -> OhlcvRow {
    let mut row = OhlcvRow::empty(timestamp);
    row.extra.reserve(schema.extra_count());
    for (field, &col) in schema.fields().iter().zip(value_columns) {
        let text = record.get(col).unwrap_or("");
        match field.role {
            FieldRole::Volume => row.volume = coerce_volume(text),
            FieldRole::Extra => row.extra.push(coerce_price(text)),
            role => row.set_price(role, coerce_price(text)),
        }
    }
    row
}

fn find_column(columns: &[String], name: &str) -> Option<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
}

fn resolve_timestamp_source(
    columns: &[String],
    layout: Option<&DateTimeLayout>,
) -> Result<TimestampSource, IngestError> {
    let lookup = |name: &str| {
        find_column(columns, name).ok_or_else(|| IngestError::MissingColumn(name.to_string()))
    };

    match layout {
        Some(DateTimeLayout::Single { column }) => {
            return Ok(TimestampSource::Single(lookup(column.as_str())?))
        }
        Some(DateTimeLayout::Split { date, time }) => {
            return Ok(TimestampSource::Split {
                date: lookup(date.as_str())?,
                time: lookup(time.as_str())?,
            })
        }
        None => {}
    }

    let date = find_column(columns, "date");
    let time = find_column(columns, "time");
    if let (Some(date), Some(time)) = (date, time) {
        return Ok(TimestampSource::Split { date, time });
    }

    if let Some(i) = TIMESTAMP_COLUMN_NAMES
        .iter()
        .find_map(|name| find_column(columns, name))
    {
        return Ok(TimestampSource::Single(i));
    }

    columns
        .iter()
        .position(|c| FieldRole::recognize(c) == FieldRole::Extra)
        .map(TimestampSource::Single)
        .ok_or_else(|| IngestError::MissingColumn("timestamp".into()))
}
