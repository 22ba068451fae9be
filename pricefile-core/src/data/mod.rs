//! File ingestion, layout detection, resampling, export and quality checks.

pub mod batch;
pub mod error;
pub mod export;
pub mod hint;
pub mod ingest;
pub mod quality;
pub mod resample;
pub mod strategy;
pub mod timestamp;

pub use batch::{ingest_all, BatchItem};
pub use error::{ExportError, IngestError};
pub use export::{to_csv_string, write_csv, write_to};
pub use hint::{DateTimeLayout, Delimiter, HintError, LayoutHint};
pub use ingest::{detect_layout, ingest, ingest_str, DERIVED_INDEX_NAME};
pub use quality::{IssueKind, QualityIssue, QualityReport, Severity};
pub use resample::{resample, Frequency, FrequencyError};
pub use strategy::{ParseStrategy, RawTable, StrategyName};
pub use timestamp::TimestampFormat;
