//! Parsing strategies: named, pure ways of splitting text into raw records.
//!
//! Detection tries [`ParseStrategy::detection_order`] in sequence and keeps
//! the first strategy that accepts. Each attempt starts from the raw text;
//! nothing carries over between attempts.
//!
//! | # | strategy            | delimiter  | header     | accepts when                 |
//! |---|---------------------|------------|------------|------------------------------|
//! | 1 | `comma-header`      | `,`        | first row  | >= 3 columns and an `Open`   |
//! | 2 | `comma-fixed`       | `,`        | fixed      | more than one column         |
//! | 3 | `tab-header`        | `\t`       | first row  | as 1                         |
//! | 4 | `tab-fixed`         | `\t`       | fixed      | as 2                         |
//! | 5 | `whitespace-header` | whitespace | first row  | as 1                         |
//! | 6 | `whitespace-fixed`  | whitespace | fixed      | as 2                         |

use csv::StringRecord;
use serde::Serialize;
use std::fmt;

use super::error::IngestError;
use super::hint::{Delimiter, LayoutHint};
use super::timestamp::TimestampFormat;
use crate::domain::FieldRole;

/// Column names assigned to headerless files.
pub const FIXED_COLUMNS: [&str; 6] = ["DateTime", "Open", "High", "Low", "Close", "Volume"];

/// Minimum column count for a header row to be accepted.
const MIN_HEADER_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyName {
    CommaHeader,
    CommaFixed,
    TabHeader,
    TabFixed,
    WhitespaceHeader,
    WhitespaceFixed,
    /// Layout pinned by a caller hint.
    Hinted,
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyName::CommaHeader => "comma-header",
            StrategyName::CommaFixed => "comma-fixed",
            StrategyName::TabHeader => "tab-header",
            StrategyName::TabFixed => "tab-fixed",
            StrategyName::WhitespaceHeader => "whitespace-header",
            StrategyName::WhitespaceFixed => "whitespace-fixed",
            StrategyName::Hinted => "hinted",
        };
        f.write_str(name)
    }
}

/// How column names are obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMode {
    /// The first record is the header.
    FirstRow,
    /// The first record is a header but these names replace it.
    Replace(Vec<String>),
    /// No header; every record is data and these names apply.
    Fixed(Vec<String>),
}

/// Text split into records with resolved column names.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub strategy: StrategyName,
    pub columns: Vec<String>,
    /// Data records (header excluded).
    pub records: Vec<StringRecord>,
    /// Field count of the header, or of the first data record when headerless.
    pub width: usize,
}

/// Why a detection strategy did not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    SingleColumn,
    TooFewColumns(usize),
    NoOpenColumn,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::SingleColumn => write!(f, "split produced a single column"),
            Rejection::TooFewColumns(n) => write!(f, "only {n} columns in header"),
            Rejection::NoOpenColumn => write!(f, "no Open column in header"),
        }
    }
}

/// Outcome of one strategy attempt.
#[derive(Debug)]
pub enum Attempt {
    Accepted(RawTable),
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrategy {
    pub name: StrategyName,
    pub delimiter: Delimiter,
    pub header: HeaderMode,
}

impl ParseStrategy {
    /// The ordered detection list: comma, then tab, then whitespace, each
    /// with the header attempt before the fixed-name fallback.
    pub fn detection_order() -> Vec<ParseStrategy> {
        let fixed = || HeaderMode::Fixed(FIXED_COLUMNS.iter().map(|s| s.to_string()).collect());
        vec![
            ParseStrategy {
                name: StrategyName::CommaHeader,
                delimiter: Delimiter::Comma,
                header: HeaderMode::FirstRow,
            },
            ParseStrategy {
                name: StrategyName::CommaFixed,
                delimiter: Delimiter::Comma,
                header: fixed(),
            },
            ParseStrategy {
                name: StrategyName::TabHeader,
                delimiter: Delimiter::Tab,
                header: HeaderMode::FirstRow,
            },
            ParseStrategy {
                name: StrategyName::TabFixed,
                delimiter: Delimiter::Tab,
                header: fixed(),
            },
            ParseStrategy {
                name: StrategyName::WhitespaceHeader,
                delimiter: Delimiter::Whitespace,
                header: HeaderMode::FirstRow,
            },
            ParseStrategy {
                name: StrategyName::WhitespaceFixed,
                delimiter: Delimiter::Whitespace,
                header: fixed(),
            },
        ]
    }

    /// The single strategy a hint pins. Unset fields default to comma,
    /// header present, names from the header.
    pub fn from_hint(hint: &LayoutHint) -> Result<ParseStrategy, IngestError> {
        let delimiter = hint.delimiter.unwrap_or(Delimiter::Comma);
        if let Delimiter::Char(c) = delimiter {
            if !c.is_ascii() || c == '"' || c == '\n' || c == '\r' {
                return Err(IngestError::InvalidHint(format!(
                    "delimiter {delimiter} must be a single ASCII character other than quote or newline"
                )));
            }
        }
        let header = match (hint.has_header.unwrap_or(true), hint.columns.clone()) {
            (true, None) => HeaderMode::FirstRow,
            (true, Some(names)) => HeaderMode::Replace(names),
            (false, Some(names)) => HeaderMode::Fixed(names),
            (false, None) => {
                HeaderMode::Fixed(FIXED_COLUMNS.iter().map(|s| s.to_string()).collect())
            }
        };
        if let HeaderMode::Replace(names) | HeaderMode::Fixed(names) = &header {
            if names.is_empty() {
                return Err(IngestError::InvalidHint("column list is empty".into()));
            }
        }
        Ok(ParseStrategy {
            name: StrategyName::Hinted,
            delimiter,
            header,
        })
    }

    /// Split `text` and resolve column names, without judging the result.
    pub fn split(&self, text: &str) -> Result<RawTable, IngestError> {
        let mut records = split_records(text, self.delimiter)?.into_iter();

        let (mut columns, header_width, mut data): (Vec<String>, Option<usize>, Vec<StringRecord>) =
            match &self.header {
                HeaderMode::FirstRow => {
                    let header = records.next();
                    let columns = header.as_ref().map(header_names).unwrap_or_default();
                    (columns, header.map(|h| h.len()), records.collect())
                }
                HeaderMode::Replace(names) => {
                    let width = records.next().map_or(0, |h| h.len());
                    (pad_names(names, width), Some(width), records.collect())
                }
                HeaderMode::Fixed(names) => (names.clone(), None, records.collect()),
            };

        if self.delimiter == Delimiter::Whitespace {
            let expected = columns.len();
            data = data
                .into_iter()
                .map(|record| join_split_timestamp(record, expected))
                .collect();
        }

        let width = header_width.unwrap_or_else(|| data.first().map_or(0, |r| r.len()));
        if matches!(self.header, HeaderMode::Fixed(_)) {
            columns = pad_names(&columns, width);
        }

        Ok(RawTable {
            strategy: self.name,
            columns,
            records: data,
            width,
        })
    }

    /// Split and apply this strategy's acceptance rule.
    pub fn attempt(&self, text: &str) -> Result<Attempt, IngestError> {
        let raw = self.split(text)?;
        if raw.width <= 1 {
            return Ok(Attempt::Rejected(Rejection::SingleColumn));
        }
        if self.header == HeaderMode::FirstRow && self.name != StrategyName::Hinted {
            if raw.width < MIN_HEADER_COLUMNS {
                return Ok(Attempt::Rejected(Rejection::TooFewColumns(raw.width)));
            }
            let has_open = raw
                .columns
                .iter()
                .any(|c| FieldRole::recognize(c) == FieldRole::Open);
            if !has_open {
                return Ok(Attempt::Rejected(Rejection::NoOpenColumn));
            }
        }
        Ok(Attempt::Accepted(raw))
    }
}

/// Split text into non-blank records.
fn split_records(text: &str, delimiter: Delimiter) -> Result<Vec<StringRecord>, IngestError> {
    let records: Vec<StringRecord> = match delimiter.as_byte() {
        Some(byte) => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(byte)
                .has_headers(false)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(text.as_bytes());
            reader.records().collect::<Result<Vec<_>, _>>()?
        }
        None => text
            .lines()
            .map(|line| line.split_whitespace().collect::<StringRecord>())
            .collect(),
    };
    Ok(records
        .into_iter()
        .filter(|r| r.iter().any(|field| !field.is_empty()))
        .collect())
}

/// Rejoin a `date time` timestamp that a whitespace split broke in two.
///
/// Only applies when the record has exactly one field more than there are
/// column names and the first two fields read back as a date plus a time.
fn join_split_timestamp(record: StringRecord, expected: usize) -> StringRecord {
    if record.len() != expected + 1 {
        return record;
    }
    let (Some(date), Some(time)) = (record.get(0), record.get(1)) else {
        return record;
    };
    let joined = format!("{date} {time}");
    if !matches!(TimestampFormat::infer(&joined), Some(TimestampFormat::DateTime(_))) {
        return record;
    }
    std::iter::once(joined.as_str())
        .chain(record.iter().skip(2))
        .collect()
}

fn header_names(header: &StringRecord) -> Vec<String> {
    header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                placeholder_name(i)
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Given names first, then placeholders for any fields beyond them.
fn pad_names(names: &[String], width: usize) -> Vec<String> {
    let mut columns = names.to_vec();
    for i in columns.len()..width {
        columns.push(placeholder_name(i));
    }
    columns
}

fn placeholder_name(index: usize) -> String {
    format!("column_{}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(strategy: &ParseStrategy, text: &str) -> Option<RawTable> {
        match strategy.attempt(text).unwrap() {
            Attempt::Accepted(raw) => Some(raw),
            Attempt::Rejected(_) => None,
        }
    }

    fn rejection(strategy: &ParseStrategy, text: &str) -> Option<Rejection> {
        match strategy.attempt(text).unwrap() {
            Attempt::Accepted(_) => None,
            Attempt::Rejected(r) => Some(r),
        }
    }

    #[test]
    fn detection_order_is_comma_tab_whitespace() {
        let names: Vec<String> = ParseStrategy::detection_order()
            .iter()
            .map(|s| s.name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "comma-header",
                "comma-fixed",
                "tab-header",
                "tab-fixed",
                "whitespace-header",
                "whitespace-fixed"
            ]
        );
    }

    #[test]
    fn comma_header_accepts_open_column() {
        let order = ParseStrategy::detection_order();
        let raw = accepted(&order[0], "DateTime,open,High,Low,Close\n2024-01-02 09:30:00,1,2,0.5,1.5\n")
            .unwrap();
        assert_eq!(raw.columns, vec!["DateTime", "open", "High", "Low", "Close"]);
        assert_eq!(raw.records.len(), 1);
        assert_eq!(raw.width, 5);
    }

    #[test]
    fn comma_header_rejects_without_open() {
        let order = ParseStrategy::detection_order();
        assert_eq!(
            rejection(&order[0], "a,b,c\n1,2,3\n"),
            Some(Rejection::NoOpenColumn)
        );
        assert_eq!(
            rejection(&order[0], "Date,Open\n2024-01-02,1\n"),
            Some(Rejection::TooFewColumns(2))
        );
    }

    #[test]
    fn fixed_treats_first_row_as_data() {
        let order = ParseStrategy::detection_order();
        let raw = accepted(&order[1], "2024-01-02 09:30:00,1,2,0.5,1.5,100\n").unwrap();
        assert_eq!(raw.columns, FIXED_COLUMNS.to_vec());
        assert_eq!(raw.records.len(), 1);
    }

    #[test]
    fn fixed_pads_extra_columns() {
        let order = ParseStrategy::detection_order();
        let raw = accepted(&order[1], "2024-01-02,1,2,0.5,1.5,100,7\n").unwrap();
        assert_eq!(raw.columns.len(), 7);
        assert_eq!(raw.columns[6], "column_7");
    }

    #[test]
    fn tab_text_is_single_column_for_comma() {
        let order = ParseStrategy::detection_order();
        let text = "DateTime\tOpen\tHigh\n2024-01-02\t1\t2\n";
        assert_eq!(rejection(&order[1], text), Some(Rejection::SingleColumn));
        assert!(accepted(&order[2], text).is_some());
    }

    #[test]
    fn whitespace_splits_runs() {
        let order = ParseStrategy::detection_order();
        let raw = accepted(&order[4], "Date  Time   Open High Low Close\n2024-01-02 09:30:00 1 2 0.5 1.5\n")
            .unwrap();
        assert_eq!(raw.columns.len(), 6);
        assert_eq!(&raw.records[0][1], "09:30:00");
    }

    #[test]
    fn whitespace_fixed_rejoins_spaced_timestamp() {
        let order = ParseStrategy::detection_order();
        let text = "2024-01-02 09:30:00 472.16 472.55 471.90 472.30 185230\n\
                    2024-01-02 09:31:00 472.30 472.80 472.10 472.65 96412\n";
        assert_eq!(rejection(&order[4], text), Some(Rejection::NoOpenColumn));
        let raw = accepted(&order[5], text).unwrap();
        assert_eq!(raw.columns, FIXED_COLUMNS.to_vec());
        assert_eq!(raw.width, 6);
        assert_eq!(&raw.records[0][0], "2024-01-02 09:30:00");
        assert_eq!(&raw.records[0][1], "472.16");
        assert_eq!(&raw.records[1][5], "96412");
    }

    #[test]
    fn whitespace_header_rejoins_spaced_timestamp() {
        let order = ParseStrategy::detection_order();
        let text = "DateTime Open High Low Close Volume\n\
                    2024-01-02 09:30 472.16 472.55 471.90 472.30 185230\n";
        let raw = accepted(&order[4], text).unwrap();
        assert_eq!(raw.columns.len(), 6);
        assert_eq!(raw.records[0].len(), 6);
        assert_eq!(&raw.records[0][0], "2024-01-02 09:30");
        assert_eq!(&raw.records[0][1], "472.16");
    }

    #[test]
    fn whitespace_leaves_non_time_second_field_alone() {
        let order = ParseStrategy::detection_order();
        // Seven genuine fields: the second is a price, not a time of day.
        let raw = accepted(&order[5], "2024-01-02 472.16 472.55 471.90 472.30 185230 7\n").unwrap();
        assert_eq!(raw.width, 7);
        assert_eq!(raw.columns[6], "column_7");
        assert_eq!(&raw.records[0][0], "2024-01-02");
    }

    #[test]
    fn comma_rows_are_never_rejoined() {
        let order = ParseStrategy::detection_order();
        let raw = accepted(&order[1], "2024-01-02,09:30:00,1,2,0.5,1.5,100\n").unwrap();
        assert_eq!(raw.width, 7);
        assert_eq!(&raw.records[0][1], "09:30:00");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let order = ParseStrategy::detection_order();
        let raw = accepted(&order[0], "\nDateTime,Open,Close\n\n2024-01-02,1,2\n   \n").unwrap();
        assert_eq!(raw.records.len(), 1);
    }

    #[test]
    fn hint_without_header_uses_given_names() {
        let hint = LayoutHint::new()
            .with_delimiter(Delimiter::Char(';'))
            .with_header(false)
            .with_columns(["ts", "Open", "Close"]);
        let strategy = ParseStrategy::from_hint(&hint).unwrap();
        let raw = strategy.split("2024-01-02;1;2\n2024-01-03;3;4\n").unwrap();
        assert_eq!(raw.strategy, StrategyName::Hinted);
        assert_eq!(raw.columns, vec!["ts", "Open", "Close"]);
        assert_eq!(raw.records.len(), 2);
    }

    #[test]
    fn hint_replaces_header_names() {
        let hint = LayoutHint::new().with_columns(["ts", "Open", "Close"]);
        let strategy = ParseStrategy::from_hint(&hint).unwrap();
        let raw = strategy.split("a,b,c\n2024-01-02,1,2\n").unwrap();
        assert_eq!(raw.columns, vec!["ts", "Open", "Close"]);
        assert_eq!(raw.records.len(), 1);
    }

    #[test]
    fn hint_rejects_non_ascii_delimiter() {
        let hint = LayoutHint::new().with_delimiter(Delimiter::Char('§'));
        assert!(matches!(
            ParseStrategy::from_hint(&hint),
            Err(IngestError::InvalidHint(_))
        ));
    }
}
