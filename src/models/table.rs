//! Tabular data: typed columns plus per-column metadata.

use super::{ColumnMeta, TableMeta};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean (logical) value.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// Character data.
    Text(String),
}

impl Value {
    /// Returns whether this value is missing.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders the value as cell text, `None` for missing values.
    ///
    /// Floats use the shortest round-tripping representation and always keep
    /// a decimal point or exponent, so `1.0` is written as `1.0` rather than `1`.
    #[must_use]
    pub fn to_cell(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Boolean(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(format!("{f:?}")),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_cell() {
            Some(cell) => f.write_str(&cell),
            None => f.write_str("NA"),
        }
    }
}

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Integer column.
    Integer,
    /// Floating point column.
    Float,
    /// Boolean column.
    Boolean,
    /// Character column.
    Text,
}

impl ColumnKind {
    /// Returns the canonical storage type name recorded in metadata.
    #[must_use]
    pub const fn storage_type(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "double",
            Self::Boolean => "logical",
            Self::Text => "character",
        }
    }
}

/// Typed column values. Every variant is nullable.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Integer values.
    Integer(Vec<Option<i64>>),
    /// Floating point values.
    Float(Vec<Option<f64>>),
    /// Boolean values.
    Boolean(Vec<Option<bool>>),
    /// Character values.
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    /// Returns whether the column holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage kind of this data.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        match self {
            Self::Integer(_) => ColumnKind::Integer,
            Self::Float(_) => ColumnKind::Float,
            Self::Boolean(_) => ColumnKind::Boolean,
            Self::Text(_) => ColumnKind::Text,
        }
    }

    /// Returns the value at `index`, or `Value::Null` when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Value {
        match self {
            Self::Integer(v) => v.get(index).copied().flatten().map_or(Value::Null, Value::Integer),
            Self::Float(v) => v.get(index).copied().flatten().map_or(Value::Null, Value::Float),
            Self::Boolean(v) => v.get(index).copied().flatten().map_or(Value::Null, Value::Boolean),
            Self::Text(v) => v
                .get(index)
                .and_then(Clone::clone)
                .map_or(Value::Null, Value::Text),
        }
    }

    /// Builds column data from loosely typed values.
    ///
    /// The narrowest kind that holds every non-null value wins: integers,
    /// then floats (integers widen), then booleans. Anything mixed becomes
    /// text. A column with no non-null values is text.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut has_int = false;
        let mut has_float = false;
        let mut has_bool = false;
        let mut has_text = false;
        for value in &values {
            match value {
                Value::Null => {},
                Value::Integer(_) => has_int = true,
                Value::Float(_) => has_float = true,
                Value::Boolean(_) => has_bool = true,
                Value::Text(_) => has_text = true,
            }
        }
        let numeric = has_int || has_float;

        if has_text || (numeric && has_bool) || !(numeric || has_bool) {
            return Self::Text(values.iter().map(Value::to_cell).collect());
        }
        if has_bool {
            return Self::Boolean(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Boolean(b) => Some(b),
                        _ => None,
                    })
                    .collect(),
            );
        }
        if has_float {
            return Self::Float(
                values
                    .into_iter()
                    .map(|v| match v {
                        Value::Float(f) => Some(f),
                        Value::Integer(i) => Some(i as f64),
                        _ => None,
                    })
                    .collect(),
            );
        }
        Self::Integer(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(i),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Infers typed data from text cells.
    ///
    /// Cells matching one of `na` are missing. The remaining cells decide
    /// the kind: all integers, all numbers, all booleans (`true`/`false` in
    /// any case), otherwise text. Text stays text; there is no categorical
    /// conversion.
    #[must_use]
    pub fn infer<'a, I>(cells: I, na: &[String]) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells: Vec<Option<&str>> = cells
            .into_iter()
            .map(|c| {
                if na.iter().any(|n| n == c) {
                    None
                } else {
                    Some(c)
                }
            })
            .collect();
        let present = || cells.iter().flatten();

        if present().next().is_none() {
            return Self::Text(vec![None; cells.len()]);
        }
        if present().all(|c| c.trim().parse::<i64>().is_ok()) {
            return Self::Integer(
                cells
                    .iter()
                    .map(|c| c.and_then(|s| s.trim().parse().ok()))
                    .collect(),
            );
        }
        if present().all(|c| c.trim().parse::<f64>().is_ok()) {
            return Self::Float(
                cells
                    .iter()
                    .map(|c| c.and_then(|s| s.trim().parse().ok()))
                    .collect(),
            );
        }
        if present().all(|c| parse_bool(c).is_some()) {
            return Self::Boolean(cells.iter().map(|c| c.and_then(parse_bool)).collect());
        }
        Self::Text(cells.iter().map(|c| c.map(String::from)).collect())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "TRUE" | "True" => Some(true),
        "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// A named column with data and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, kept verbatim from the source.
    pub name: String,
    /// Typed values.
    pub data: ColumnData,
    /// Format-specific metadata collected on import.
    pub meta: ColumnMeta,
}

impl Column {
    /// Creates a column with empty metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
            meta: ColumnMeta::default(),
        }
    }

    /// Creates an integer column.
    #[must_use]
    pub fn integers(name: impl Into<String>, values: impl IntoIterator<Item = Option<i64>>) -> Self {
        Self::new(name, ColumnData::Integer(values.into_iter().collect()))
    }

    /// Creates a float column.
    #[must_use]
    pub fn floats(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        Self::new(name, ColumnData::Float(values.into_iter().collect()))
    }

    /// Creates a boolean column.
    #[must_use]
    pub fn booleans(name: impl Into<String>, values: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values.into_iter().collect()))
    }

    /// Creates a character column.
    #[must_use]
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|v| v.map(Into::into)).collect()),
        )
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: ColumnMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns whether the column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Storage kind.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        self.data.kind()
    }
}

/// An in-memory table of equally long named columns.
///
/// Column order is significant and preserved through import and export.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    /// Table-level metadata.
    pub meta: TableMeta,
}

impl Table {
    /// Creates a table, checking that all columns have the same length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if column lengths differ.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(Error::InvalidInput(format!(
                    "column '{}' has {} rows, expected {rows}",
                    bad.name,
                    bad.len()
                )));
            }
        }
        Ok(Self {
            columns,
            meta: TableMeta::default(),
        })
    }

    /// Re-checks the equal-length invariant, keeping metadata.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if column lengths differ.
    pub fn validated(self) -> Result<Self> {
        let meta = self.meta;
        Ok(Self::new(self.columns)?.with_meta(meta))
    }

    /// Sets table metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: TableMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// All columns in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Looks up the first column with the given name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Mutable access to a column's metadata.
    ///
    /// Data is not exposed mutably so the equal-length invariant holds.
    pub fn column_meta_mut(&mut self, name: &str) -> Option<&mut ColumnMeta> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.meta)
    }

    /// Iterates over all column metadata mutably.
    pub fn column_metas_mut(&mut self) -> impl Iterator<Item = (&str, ColumnKind, &mut ColumnMeta)> {
        self.columns
            .iter_mut()
            .map(|c| (c.name.as_str(), c.data.kind(), &mut c.meta))
    }

    /// Returns one row as values.
    #[must_use]
    pub fn row(&self, index: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.data.get(index)).collect()
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.n_rows()).map(|i| self.row(i))
    }

    /// Returns whether both tables hold the same names, kinds and values,
    /// ignoring metadata.
    #[must_use]
    pub fn same_data(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.name == b.name && a.data == b.data)
    }

    /// Builds a table from named, loosely typed rows.
    ///
    /// Columns appear in first-seen key order; rows missing a key get nulls.
    #[must_use]
    pub fn from_records(records: Vec<Vec<(String, Value)>>) -> Self {
        let mut names: Vec<String> = Vec::new();
        for record in &records {
            for (key, _) in record {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(records.len()); names.len()];
        for record in records {
            let mut row = vec![Value::Null; names.len()];
            for (key, value) in record {
                if let Some(i) = names.iter().position(|n| *n == key) {
                    row[i] = value;
                }
            }
            for (column, value) in cells.iter_mut().zip(row) {
                column.push(value);
            }
        }

        let columns = names
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column::new(name, ColumnData::from_values(values)))
            .collect();
        Self {
            columns,
            meta: TableMeta::default(),
        }
    }
}

/// A table with a section name, for multi-section exports.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    /// Section (sheet) name.
    pub name: String,
    /// The table.
    pub table: Table,
}

/// Ordered collection of named tables.
///
/// Insertion order becomes sheet or section order on export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSet {
    tables: Vec<NamedTable>,
}

impl TableSet {
    /// Default section name for a lone table without a name.
    pub const DEFAULT_NAME: &'static str = "Sheet1";

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Wraps a single table, named after its metadata or `Sheet1`.
    #[must_use]
    pub fn single(table: Table) -> Self {
        let name = table
            .meta
            .name
            .clone()
            .unwrap_or_else(|| Self::DEFAULT_NAME.to_string());
        Self {
            tables: vec![NamedTable { name, table }],
        }
    }

    /// Inserts a table. An existing entry with the same name is replaced
    /// in place, keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        if let Some(existing) = self.tables.iter_mut().find(|t| t.name == name) {
            existing.table = table;
        } else {
            self.tables.push(NamedTable { name, table });
        }
    }

    /// Builder form of [`TableSet::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, table: Table) -> Self {
        self.insert(name, table);
        self
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedTable> {
        self.tables.iter()
    }

    /// Returns the first table, if any.
    #[must_use]
    pub fn first(&self) -> Option<&NamedTable> {
        self.tables.first()
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name).map(|t| &t.table)
    }
}
