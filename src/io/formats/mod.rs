//! Built-in format handlers.
//!
//! Each handler implements [`Importer`](super::Importer) and/or
//! [`Exporter`](super::Exporter) on top of a codec crate. The dispatcher
//! never touches these types directly; it only sees the [`HandlerPair`]s
//! returned by [`builtin_handlers`].

#[cfg(any(feature = "parquet", feature = "feather"))]
mod arrow_table;
pub mod delimited;
#[cfg(feature = "feather")]
pub mod feather;
pub mod fixed_width;
pub mod html;
pub mod json;
#[cfg(feature = "parquet")]
pub mod parquet;
pub mod yaml;

use super::registry::HandlerPair;
use super::traits::HandlerOptions;
use crate::models::{Column, ColumnData, Table, Value};
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Missing-value markers used when a handler is given no `na` option.
pub const DEFAULT_NA: [&str; 2] = ["", "NA"];

/// Returns every handler compiled into this build, keyed by canonical tag.
#[must_use]
pub fn builtin_handlers() -> Vec<(&'static str, HandlerPair)> {
    let mut handlers = vec![
        (
            "csv",
            HandlerPair::new(delimited::Delimited::csv(), delimited::Delimited::csv()),
        ),
        (
            "tsv",
            HandlerPair::new(delimited::Delimited::tsv(), delimited::Delimited::tsv()),
        ),
        (
            "psv",
            HandlerPair::new(delimited::Delimited::psv(), delimited::Delimited::psv()),
        ),
        ("json", HandlerPair::new(json::JsonFormat, json::JsonFormat)),
        ("yaml", HandlerPair::new(yaml::YamlFormat, yaml::YamlFormat)),
        (
            "fwf",
            HandlerPair::new(fixed_width::FixedWidth, fixed_width::FixedWidth),
        ),
        ("html", HandlerPair::export_only(html::HtmlTables)),
    ];
    #[cfg(feature = "parquet")]
    handlers.push((
        "parquet",
        HandlerPair::new(parquet::ParquetFormat, parquet::ParquetFormat),
    ));
    #[cfg(feature = "feather")]
    handlers.push((
        "feather",
        HandlerPair::new(feather::FeatherFormat, feather::FeatherFormat),
    ));
    handlers
}

/// Missing-value markers from the `na` option, or [`DEFAULT_NA`].
///
/// An empty `na` value turns markers off; `na=,` marks only empty cells.
pub(crate) fn na_values(options: &HandlerOptions) -> Vec<String> {
    match options.get("na") {
        Some("") => Vec::new(),
        Some(_) => options.list("na").unwrap_or_default(),
        None => DEFAULT_NA.iter().map(ToString::to_string).collect(),
    }
}

pub(crate) fn open_reader(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::operation("open_file", format!("{}: {e}", path.display())))
}

pub(crate) fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| Error::operation("create_file", format!("{}: {e}", path.display())))
}

/// Builds a table from named value vectors, as found in column-oriented
/// JSON or YAML documents.
pub(crate) fn table_from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Table> {
    Table::new(
        columns
            .into_iter()
            .map(|(name, values)| Column::new(name, ColumnData::from_values(values)))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags_are_unique() {
        let handlers = builtin_handlers();
        let mut tags: Vec<_> = handlers.iter().map(|(tag, _)| *tag).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), handlers.len());
    }

    #[test]
    fn test_na_values_default_and_override() {
        assert_eq!(na_values(&HandlerOptions::new()), vec!["", "NA"]);
        assert_eq!(
            na_values(&HandlerOptions::new().with("na", "-,.")),
            vec!["-", "."]
        );
        assert!(na_values(&HandlerOptions::new().with("na", "")).is_empty());
        assert_eq!(na_values(&HandlerOptions::new().with("na", ",")), vec!["", ""]);
    }
}
