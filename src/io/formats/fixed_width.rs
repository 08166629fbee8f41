//! Fixed-width text.
//!
//! Column boundaries come from the `widths` option, or are inferred from the
//! header line: a column starts wherever a non-blank follows a blank. Cells
//! and names are trimmed of padding, so leading and trailing spaces do not
//! survive a round trip.
//!
//! On export every column is padded to its widest cell, separated by one
//! space, with a header line the importer can infer boundaries from. Header
//! names must therefore be non-empty and free of whitespace.

use super::{create_writer, na_values, open_reader};
use crate::io::traits::{Exporter, HandlerOptions, Importer, single_table};
use crate::models::{Column, ColumnData, Table, TableSet};
use crate::{Error, Result};
use std::io::{BufRead, Write};
use std::path::Path;

/// Fixed-width text handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWidth;

/// Character span of one column; `None` end runs to the end of the line.
type Span = (usize, Option<usize>);

fn spans_from_widths(widths: &[String]) -> Result<Vec<Span>> {
    let mut spans = Vec::with_capacity(widths.len());
    let mut start = 0;
    for raw in widths {
        let width: usize = raw.trim().parse().map_err(|_| {
            Error::InvalidInput(format!("option 'widths' has invalid width '{raw}'"))
        })?;
        if width == 0 {
            return Err(Error::InvalidInput(
                "option 'widths' must not contain zero".to_string(),
            ));
        }
        spans.push((start, Some(start + width)));
        start += width;
    }
    Ok(spans)
}

fn spans_from_header(header: &str) -> Vec<Span> {
    let chars: Vec<char> = header.chars().collect();
    let starts: Vec<usize> = (0..chars.len())
        .filter(|&i| !chars[i].is_whitespace() && (i == 0 || chars[i - 1].is_whitespace()))
        .collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| (if n == 0 { 0 } else { start }, starts.get(n + 1).copied()))
        .collect()
}

fn slice(chars: &[char], (start, end): Span) -> String {
    let end = end.unwrap_or(chars.len()).min(chars.len());
    if start >= end {
        return String::new();
    }
    chars[start..end].iter().collect::<String>().trim().to_string()
}

impl Importer for FixedWidth {
    fn import(&self, path: &Path, options: &HandlerOptions) -> Result<Table> {
        let header = options.flag("header", true)?;
        let na = na_values(options);

        let mut lines = Vec::new();
        for line in open_reader(path)?.lines() {
            let line = line.map_err(|e| Error::operation("read_fwf", e))?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }

        let header_line = if header && !lines.is_empty() {
            Some(lines.remove(0))
        } else {
            None
        };
        let spans = match (options.list("widths"), &header_line) {
            (Some(widths), _) => spans_from_widths(&widths)?,
            (None, Some(line)) => spans_from_header(line),
            (None, None) if lines.is_empty() => Vec::new(),
            (None, None) => {
                return Err(Error::InvalidInput(
                    "fixed-width import without a header needs the 'widths' option".to_string(),
                ));
            },
        };

        let header_chars: Vec<char> = header_line.as_deref().unwrap_or_default().chars().collect();
        let rows: Vec<Vec<char>> = lines.iter().map(|l| l.chars().collect()).collect();

        let columns = spans
            .iter()
            .enumerate()
            .map(|(i, &span)| {
                let name = if header_line.is_some() {
                    slice(&header_chars, span)
                } else {
                    format!("V{}", i + 1)
                };
                let cells: Vec<String> = rows.iter().map(|row| slice(row, span)).collect();
                let mut column = Column::new(
                    name,
                    ColumnData::infer(cells.iter().map(String::as_str), &na),
                );
                if let (start, Some(end)) = span {
                    column.meta.format = Some(format!("{}", end - start));
                }
                column
            })
            .collect();
        Table::new(columns)
    }
}

impl Exporter for FixedWidth {
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()> {
        let table = single_table(tables, "fwf")?;
        let header = options.flag("header", true)?;
        let missing = na_values(options).into_iter().next().unwrap_or_default();
        let unwritable = table
            .column_names()
            .into_iter()
            .find(|name| name.is_empty() || name.chars().any(char::is_whitespace));
        if let (true, Some(name)) = (header, unwritable) {
            return Err(Error::InvalidInput(format!(
                "fixed-width header cannot hold column name '{name}': names must be non-empty without whitespace"
            )));
        }

        let cells: Vec<Vec<String>> = table
            .rows()
            .map(|row| {
                row.iter()
                    .map(|v| v.to_cell().unwrap_or_else(|| missing.clone()))
                    .collect()
            })
            .collect();
        let widths: Vec<usize> = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, column)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.name.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(1)
            })
            .collect();

        let mut writer = create_writer(path)?;
        let mut write_line = |fields: Vec<&str>| -> Result<()> {
            let line = fields
                .iter()
                .zip(&widths)
                .map(|(field, &width)| format!("{field:<width$}"))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "{}", line.trim_end()).map_err(|e| Error::operation("write_fwf", e))
        };

        if header {
            write_line(table.column_names())?;
        }
        for row in &cells {
            write_line(row.iter().map(String::as_str).collect())?;
        }
        writer
            .flush()
            .map_err(|e| Error::operation("flush_fwf", e))?;
        Ok(())
    }
}
