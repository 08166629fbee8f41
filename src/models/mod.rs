//! Data models for tabport.
//!
//! [`Table`] is the common currency between import and export: ordered,
//! equally long typed columns plus uniform per-column metadata.

mod metadata;
mod table;

pub use metadata::{ColumnMeta, TableMeta};
pub use table::{Column, ColumnData, ColumnKind, NamedTable, Table, TableSet, Value};
