//! Structured error types for ingestion and export.
//!
//! Numeric cells never produce errors: they coerce to `Cell::Missing`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized format: no delimiter/header layout produced a price-column schema")]
    UnrecognizedFormat,

    #[error(
        "timestamp parse failure at data row {row}: '{value}' ({})",
        .pattern.as_deref().unwrap_or("no known format matched")
    )]
    TimestampParseFailure {
        /// 1-based data row (header excluded).
        row: usize,
        value: String,
        /// Format inferred from the first parseable row, if any row parsed.
        pattern: Option<String>,
    },

    #[error("file contains no data rows")]
    Empty,

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("invalid layout hint: {0}")]
    InvalidHint(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_failure_message_names_row_and_format() {
        let err = IngestError::TimestampParseFailure {
            row: 3,
            value: "garbage".into(),
            pattern: Some("%Y-%m-%d".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("garbage"));
        assert!(msg.contains("%Y-%m-%d"));
    }

    #[test]
    fn not_found_message_has_path() {
        let err = IngestError::NotFound {
            path: PathBuf::from("/no/such/file.csv"),
        };
        assert!(err.to_string().contains("/no/such/file.csv"));
    }
}
