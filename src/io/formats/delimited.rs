//! Delimited text (csv, tsv, psv).
//!
//! Header names are kept verbatim: no trimming, no renaming of duplicates.
//! Column types are inferred from the cell text.
//!
//! # Options
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `delimiter` | per format | Single-byte field delimiter |
//! | `header` | `true` | First row holds column names |
//! | `na` | `,NA` | Cells read as missing; the first entry is written for missing values |
//! | `quote` | `"` | Single-byte quote character |

use super::{create_writer, na_values, open_reader};
use crate::io::traits::{Exporter, HandlerOptions, Importer, single_table};
use crate::models::{Column, ColumnData, Table, TableSet};
use crate::{Error, Result};
use std::path::Path;

/// Delimited text handler, parameterized by its default delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimited {
    delimiter: u8,
    tag: &'static str,
}

impl Delimited {
    /// Comma-separated values.
    #[must_use]
    pub const fn csv() -> Self {
        Self {
            delimiter: b',',
            tag: "csv",
        }
    }

    /// Tab-separated values.
    #[must_use]
    pub const fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            tag: "tsv",
        }
    }

    /// Pipe-separated values.
    #[must_use]
    pub const fn psv() -> Self {
        Self {
            delimiter: b'|',
            tag: "psv",
        }
    }

    fn delimiter(&self, options: &HandlerOptions) -> Result<u8> {
        byte_option(options, "delimiter", self.delimiter)
    }
}

fn byte_option(options: &HandlerOptions, key: &str, default: u8) -> Result<u8> {
    match options.get(key) {
        None => Ok(default),
        Some("\\t" | "tab") => Ok(b'\t'),
        Some(raw) => match raw.as_bytes() {
            [byte] => Ok(*byte),
            _ => Err(Error::InvalidInput(format!(
                "option '{key}' must be a single byte, got '{raw}'"
            ))),
        },
    }
}

fn csv_error(operation: &str) -> impl Fn(csv::Error) -> Error + '_ {
    move |e| Error::operation(operation, e)
}

impl Importer for Delimited {
    fn import(&self, path: &Path, options: &HandlerOptions) -> Result<Table> {
        let header = options.flag("header", true)?;
        let na = na_values(options);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter(options)?)
            .quote(byte_option(options, "quote", b'"')?)
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(open_reader(path)?);

        let mut rows: Vec<csv::StringRecord> = Vec::new();
        for record in reader.records() {
            rows.push(record.map_err(csv_error("read_delimited"))?);
        }

        let names: Vec<String> = if header && !rows.is_empty() {
            rows.remove(0).iter().map(String::from).collect()
        } else {
            Vec::new()
        };
        let width = rows
            .iter()
            .map(csv::StringRecord::len)
            .chain(std::iter::once(names.len()))
            .max()
            .unwrap_or(0);

        // Short rows are padded with the first missing-value marker.
        let pad = na.first().map_or("", String::as_str);
        let columns = (0..width)
            .map(|i| {
                let name = names
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| format!("V{}", i + 1));
                let cells = rows.iter().map(|row| row.get(i).unwrap_or(pad));
                Column::new(name, ColumnData::infer(cells, &na))
            })
            .collect();

        let mut table = Table::new(columns)?;
        table.meta.attributes.insert(
            "delimiter".to_string(),
            char::from(self.delimiter(options)?).to_string(),
        );
        tracing::debug!(
            format = self.tag,
            rows = table.n_rows(),
            cols = table.n_cols(),
            "Read delimited file"
        );
        Ok(table)
    }
}

impl Exporter for Delimited {
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()> {
        let table = single_table(tables, self.tag)?;
        let header = options.flag("header", true)?;
        let missing = na_values(options).into_iter().next().unwrap_or_default();

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter(options)?)
            .quote(byte_option(options, "quote", b'"')?)
            .from_writer(create_writer(path)?);

        if header {
            writer
                .write_record(table.column_names())
                .map_err(csv_error("write_delimited"))?;
        }
        for row in table.rows() {
            let cells = row
                .iter()
                .map(|value| value.to_cell().unwrap_or_else(|| missing.clone()));
            writer
                .write_record(cells)
                .map_err(csv_error("write_delimited"))?;
        }
        writer
            .flush()
            .map_err(|e| Error::operation("flush_delimited", e))?;
        Ok(())
    }
}
