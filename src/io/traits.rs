//! Core traits for import/export handlers.
//!
//! Defines the [`Importer`] and [`Exporter`] traits that format handlers
//! implement, and the [`HandlerOptions`] passed through to them untouched.

use crate::models::{Table, TableSet};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Passthrough options for format handlers.
///
/// The engines never interpret these; each handler documents the keys it
/// reads. Values are strings and parsed on demand.
///
/// # Common Keys
///
/// | Key | Used by | Meaning |
/// |-----|---------|---------|
/// | `delimiter` | csv, tsv, psv | Single-byte field delimiter |
/// | `header` | csv, tsv, psv, fwf | Whether the first row holds names |
/// | `na` | text formats | Comma-separated missing-value markers |
/// | `widths` | fwf | Comma-separated column widths |
/// | `pretty` | json | Pretty-print output |
/// | `title` | html | Document title |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    values: BTreeMap<String, String>,
}

impl HandlerOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets an option in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Parses a `key=value` pair, as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair has no `=` or an empty key.
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            },
            _ => Err(Error::InvalidInput(format!(
                "option '{pair}' must have the form key=value"
            ))),
        }
    }

    /// Returns the raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parses the value for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is present but does not parse.
    pub fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|_| {
                    Error::InvalidInput(format!("option '{key}' has invalid value '{raw}'"))
                })
            })
            .transpose()
    }

    /// Reads a boolean flag, accepting `true/false`, `yes/no`, `1/0`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is present but not a boolean.
    pub fn flag(&self, key: &str, default: bool) -> Result<bool> {
        match self.get(key).map(|v| v.trim().to_lowercase()).as_deref() {
            None => Ok(default),
            Some("true" | "yes" | "1") => Ok(true),
            Some("false" | "no" | "0") => Ok(false),
            Some(other) => Err(Error::InvalidInput(format!(
                "option '{key}' must be a boolean, got '{other}'"
            ))),
        }
    }

    /// Reads a comma-separated list. Empty entries are kept.
    #[must_use]
    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key)
            .map(|raw| raw.split(',').map(String::from).collect())
    }

    /// Iterates over all options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HandlerOptions {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Reads a table from a local file.
///
/// The dispatcher resolves URLs, archives and the clipboard to a local file
/// before calling the handler, so implementations only deal with paths.
///
/// Closures of the right shape implement this trait:
///
/// ```rust,ignore
/// registry.register_importer("dat", |path: &Path, _opts: &HandlerOptions| {
///     my_reader::read(path)
/// });
/// ```
pub trait Importer: Send + Sync {
    /// Reads the file at `path` into a table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn import(&self, path: &Path, options: &HandlerOptions) -> Result<Table>;
}

/// Writes tables to a local file.
///
/// # Lifecycle
///
/// The engine hands the exporter a staging path; the file only reaches its
/// final location after `export` returns `Ok`.
pub trait Exporter: Send + Sync {
    /// Writes the tables to `path`.
    ///
    /// Single-table formats receive a set with exactly one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or I/O fails.
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()>;

    /// Whether the format holds several named sections (sheets).
    fn supports_multiple(&self) -> bool {
        false
    }
}

impl<F> Importer for F
where
    F: Fn(&Path, &HandlerOptions) -> Result<Table> + Send + Sync,
{
    fn import(&self, path: &Path, options: &HandlerOptions) -> Result<Table> {
        self(path, options)
    }
}

impl<F> Exporter for F
where
    F: Fn(&TableSet, &Path, &HandlerOptions) -> Result<()> + Send + Sync,
{
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()> {
        self(tables, path, options)
    }
}

/// Returns the single table of a set, rejecting multi-table input.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the set is empty or holds several tables.
pub fn single_table<'a>(tables: &'a TableSet, format: &str) -> Result<&'a Table> {
    match (tables.len(), tables.first()) {
        (1, Some(named)) => Ok(&named.table),
        (n, _) => Err(Error::InvalidInput(format!(
            "format '{format}' holds exactly one table, got {n}"
        ))),
    }
}
