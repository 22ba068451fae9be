//! Domain types: cells, rows, schema and the ingested table.

pub mod cell;
pub mod row;
pub mod schema;
pub mod table;

pub use cell::{coerce_price, coerce_volume, Cell};
pub use row::OhlcvRow;
pub use schema::{Field, FieldRole, Schema};
pub use table::{OhlcvTable, TableSummary};
