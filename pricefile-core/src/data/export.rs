//! CSV export of an ingested table.
//!
//! The header is the schema (index first). Rows are written in table order
//! with no deduplication. Missing cells are empty fields, so the output
//! ingests back to the same table.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::error::ExportError;
use crate::domain::{FieldRole, OhlcvRow, OhlcvTable};

/// Timestamp layout of written files. The fraction is only printed when
/// non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Write `table` as comma-separated text to `path`.
pub fn write_csv(table: &OhlcvTable, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_to(table, io::BufWriter::new(file))
}

/// Write `table` as comma-separated text to any writer.
pub fn write_to<W: Write>(table: &OhlcvTable, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.schema().names())?;
    for row in table.rows() {
        wtr.write_record(render_row(table, row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render `table` to a CSV string.
pub fn to_csv_string(table: &OhlcvTable) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_to(table, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn render_row(table: &OhlcvTable, row: &OhlcvRow) -> Vec<String> {
    let mut record = Vec::with_capacity(table.schema().fields().len() + 1);
    record.push(row.timestamp.format(TIMESTAMP_FORMAT).to_string());
    let mut extras = row.extra.iter();
    for field in table.schema().fields() {
        let rendered = match field.role {
            FieldRole::Volume => row.volume.to_string(),
            FieldRole::Extra => extras.next().map(|c| c.to_string()).unwrap_or_default(),
            role => row
                .price(role)
                .map(|c| c.to_string())
                .unwrap_or_default(),
        };
        record.push(rendered);
    }
    record
}
