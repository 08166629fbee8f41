//! Feather (Arrow IPC file) adapter. Requires the `feather` feature.

use super::arrow_table;
use crate::io::traits::{Exporter, HandlerOptions, Importer, single_table};
use crate::models::{Table, TableSet};
use crate::{Error, Result};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use std::fs::File;
use std::path::Path;

/// Feather v2 handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatherFormat;

impl Importer for FeatherFormat {
    fn import(&self, path: &Path, _options: &HandlerOptions) -> Result<Table> {
        let file = File::open(path).map_err(|e| Error::operation("open_file", e))?;
        let reader =
            FileReader::try_new(file, None).map_err(|e| Error::operation("read_feather", e))?;
        let schema = reader.schema();
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("read_feather", e))?;
        arrow_table::from_batches(&schema, &batches)
    }
}

impl Exporter for FeatherFormat {
    fn export(&self, tables: &TableSet, path: &Path, _options: &HandlerOptions) -> Result<()> {
        let table = single_table(tables, "feather")?;
        let schema = arrow_table::schema(table)?;
        let batch = arrow_table::to_batch(table, schema.clone())?;

        let file = File::create(path).map_err(|e| Error::operation("create_file", e))?;
        let mut writer =
            FileWriter::try_new(file, &schema).map_err(|e| Error::operation("write_feather", e))?;
        writer
            .write(&batch)
            .map_err(|e| Error::operation("write_feather", e))?;
        writer
            .finish()
            .map_err(|e| Error::operation("finish_feather", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;
    use tempfile::TempDir;

    #[test]
    fn test_feather_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.feather");
        let table = Table::new(vec![
            Column::booleans("flag", [Some(true), None]),
            Column::text("name", [Some("a"), Some("b")]),
        ])
        .unwrap();

        FeatherFormat
            .export(&TableSet::single(table.clone()), &path, &HandlerOptions::new())
            .unwrap();
        let back = FeatherFormat.import(&path, &HandlerOptions::new()).unwrap();
        assert!(back.same_data(&table));
    }
}
