//! Layout hints: caller-supplied overrides for delimiter, header and
//! timestamp columns.
//!
//! A hint that sets `delimiter`, `has_header` or `columns` pins the
//! structural layout and skips detection. `datetime` and
//! `timestamp_format` apply on top of either path.
//!
//! Hints can be written as TOML:
//!
//! ```toml
//! delimiter = "tab"
//! has_header = true
//! timestamp_format = "%Y%m%d %H%M%S"
//!
//! [datetime]
//! kind = "split"
//! date = "Date"
//! time = "Time"
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Tab,
    /// Any run of spaces and tabs.
    Whitespace,
    Char(char),
}

impl Delimiter {
    /// Single-byte delimiter for the csv reader. `None` for whitespace runs
    /// and non-ASCII characters.
    pub fn as_byte(self) -> Option<u8> {
        match self {
            Delimiter::Comma => Some(b','),
            Delimiter::Tab => Some(b'\t'),
            Delimiter::Whitespace => None,
            Delimiter::Char(c) if c.is_ascii() => Some(c as u8),
            Delimiter::Char(_) => None,
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Comma => write!(f, "comma"),
            Delimiter::Tab => write!(f, "tab"),
            Delimiter::Whitespace => write!(f, "whitespace"),
            Delimiter::Char(c) => write!(f, "'{c}'"),
        }
    }
}

impl FromStr for Delimiter {
    type Err = HintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "tab" | "\\t" | "\t" => Ok(Delimiter::Tab),
            "whitespace" | "space" | "\\s+" => Ok(Delimiter::Whitespace),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Delimiter::Char(c)),
                    _ => Err(HintError::Delimiter(s.to_string())),
                }
            }
        }
    }
}

/// Where the timestamp comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateTimeLayout {
    /// One column holds date and time.
    Single { column: String },
    /// Separate date and time columns, joined with a single space.
    Split { date: String, time: String },
}

/// Explicit layout for one ingestion call. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutHint {
    pub delimiter: Option<Delimiter>,
    pub has_header: Option<bool>,
    /// Column names. With a header row they replace it; without one they
    /// name the fields of every row.
    pub columns: Option<Vec<String>>,
    pub datetime: Option<DateTimeLayout>,
    /// chrono format string applied to every timestamp instead of inference.
    pub timestamp_format: Option<String>,
}

impl LayoutHint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a hint from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, HintError> {
        let content = std::fs::read_to_string(path).map_err(|source| HintError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a hint from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, HintError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = Some(has_header);
        self
    }

    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_datetime(mut self, layout: DateTimeLayout) -> Self {
        self.datetime = Some(layout);
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    /// True when the hint fixes the structural layout, so detection is skipped.
    pub fn pins_structure(&self) -> bool {
        self.delimiter.is_some() || self.has_header.is_some() || self.columns.is_some()
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn overlay(self, overrides: LayoutHint) -> Self {
        Self {
            delimiter: overrides.delimiter.or(self.delimiter),
            has_header: overrides.has_header.or(self.has_header),
            columns: overrides.columns.or(self.columns),
            datetime: overrides.datetime.or(self.datetime),
            timestamp_format: overrides.timestamp_format.or(self.timestamp_format),
        }
    }
}

#[derive(Debug, Error)]
pub enum HintError {
    #[error("failed to read layout file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown delimiter '{0}' (expected comma, tab, whitespace or a single character)")]
    Delimiter(String),
}
