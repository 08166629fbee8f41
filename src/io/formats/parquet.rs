//! Apache Parquet adapter.
//!
//! Requires the `parquet` feature (on by default). Writes a single row group
//! with Snappy compression unless `compression=none` is given.

use super::arrow_table;
use crate::io::traits::{Exporter, HandlerOptions, Importer, single_table};
use crate::models::{Table, TableSet};
use crate::{Error, Result};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;

/// Parquet handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetFormat;

fn compression(options: &HandlerOptions) -> Result<Compression> {
    match options.get("compression").unwrap_or("snappy") {
        "snappy" => Ok(Compression::SNAPPY),
        "none" | "uncompressed" => Ok(Compression::UNCOMPRESSED),
        other => Err(Error::InvalidInput(format!(
            "option 'compression' must be 'snappy' or 'none', got '{other}'"
        ))),
    }
}

impl Importer for ParquetFormat {
    fn import(&self, path: &Path, _options: &HandlerOptions) -> Result<Table> {
        let file = File::open(path).map_err(|e| Error::operation("open_file", e))?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| Error::operation("read_parquet", e))?;
        let schema = builder.schema().clone();
        let reader = builder
            .build()
            .map_err(|e| Error::operation("read_parquet", e))?;

        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("read_parquet", e))?;
        arrow_table::from_batches(&schema, &batches)
    }
}

impl Exporter for ParquetFormat {
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()> {
        let table = single_table(tables, "parquet")?;
        let schema = arrow_table::schema(table)?;
        let batch = arrow_table::to_batch(table, schema.clone())?;

        let props = WriterProperties::builder()
            .set_compression(compression(options)?)
            .build();
        let file = File::create(path).map_err(|e| Error::operation("create_file", e))?;
        let mut writer = ArrowWriter::try_new(file, schema, Some(props))
            .map_err(|e| Error::operation("write_parquet", e))?;
        writer
            .write(&batch)
            .map_err(|e| Error::operation("write_parquet", e))?;
        writer
            .close()
            .map_err(|e| Error::operation("close_parquet", e))?;
        Ok(())
    }
}
