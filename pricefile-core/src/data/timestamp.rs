//! Timestamp inference, first row wins.
//!
//! The format is taken from the first value that parses under any known
//! format and then applied to every row. A single row that does not parse
//! under that format fails the whole column.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::IngestError;

/// Date-time formats tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%d %H%M%S",
];

/// Date-only formats; they parse to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    DateTime(&'static str),
    Date(&'static str),
    /// Caller-supplied chrono pattern; tried as date-time, then as date.
    Custom(String),
}

impl TimestampFormat {
    /// First known format that parses `value`.
    pub fn infer(value: &str) -> Option<TimestampFormat> {
        let value = value.trim();
        if let Some(fmt) = DATETIME_FORMATS
            .iter()
            .copied()
            .find(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
        {
            return Some(TimestampFormat::DateTime(fmt));
        }
        DATE_FORMATS
            .iter()
            .copied()
            .find(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
            .map(TimestampFormat::Date)
    }

    pub fn pattern(&self) -> &str {
        match self {
            TimestampFormat::DateTime(p) | TimestampFormat::Date(p) => *p,
            TimestampFormat::Custom(p) => p.as_str(),
        }
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        match self {
            TimestampFormat::DateTime(p) => NaiveDateTime::parse_from_str(value, p).ok(),
            TimestampFormat::Date(p) => parse_date(value, p),
            TimestampFormat::Custom(p) => NaiveDateTime::parse_from_str(value, p)
                .ok()
                .or_else(|| parse_date(value, p)),
        }
    }
}

fn parse_date(value: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(value, pattern)
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Parse a whole timestamp column under one format.
///
/// `explicit` overrides inference. Errors carry the 1-based data row.
pub fn parse_column(
    values: &[String],
    explicit: Option<&str>,
) -> Result<Vec<NaiveDateTime>, IngestError> {
    let format = match explicit {
        Some(p) => TimestampFormat::Custom(p.to_string()),
        None => match values.iter().find_map(|v| TimestampFormat::infer(v)) {
            Some(f) => f,
            None => {
                return Err(IngestError::TimestampParseFailure {
                    row: 1,
                    value: values.first().cloned().unwrap_or_default(),
                    pattern: None,
                })
            }
        },
    };
    tracing::trace!(pattern = format.pattern(), "timestamp format selected");

    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            format
                .parse(value)
                .ok_or_else(|| IngestError::TimestampParseFailure {
                    row: i + 1,
                    value: value.clone(),
                    pattern: Some(format.pattern().to_string()),
                })
        })
        .collect()
}
