//! pricefile core: tolerant ingestion of OHLCV price files.
//!
//! This crate contains:
//! - Domain types (cells, rows, schema, table)
//! - Layout detection over delimiter/header strategies, with caller hints
//! - Timestamp inference and per-cell numeric coercion
//! - Resampling, CSV export, quality reports and batch ingestion
//! - Deterministic table fingerprints
//!
//! ```no_run
//! use pricefile_core::data::{ingest, resample, Frequency};
//! use std::path::Path;
//!
//! let table = ingest(Path::new("SPY_1min.txt"), None)?;
//! let daily = resample(&table, Frequency::DAILY);
//! println!("{} rows -> {} daily bars", table.len(), daily.len());
//! # Ok::<(), pricefile_core::data::IngestError>(())
//! ```

pub mod data;
pub mod domain;
pub mod fingerprint;
