//! JSON adapter.
//!
//! Import accepts three layouts:
//! - **Records**: an array of objects `[{"a": 1}, {"a": 2}]`
//! - **Columns**: an object of equally long arrays `{"a": [1, 2]}`
//! - **NDJSON/JSONL**: one object per line
//!
//! Export writes records by default, or columns with `orient=columns`.
//! Nested arrays and objects are kept as JSON text.

use super::{create_writer, open_reader, table_from_columns};
use crate::io::traits::{Exporter, HandlerOptions, Importer, single_table};
use crate::models::{Table, TableSet, Value};
use crate::{Error, Result};
use serde_json::{Map, Number, Value as JsonValue};
use std::io::Write;
use std::path::Path;

/// JSON handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

fn to_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        JsonValue::String(s) => Value::Text(s),
        nested @ (JsonValue::Array(_) | JsonValue::Object(_)) => Value::Text(nested.to_string()),
    }
}

fn from_value(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::Integer(i) => JsonValue::Number(i.into()),
        // NaN and infinities have no JSON representation.
        Value::Float(f) => Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s),
    }
}

fn record(object: Map<String, JsonValue>) -> Vec<(String, Value)> {
    object.into_iter().map(|(k, v)| (k, to_value(v))).collect()
}

fn table_from_document(document: JsonValue) -> Result<Table> {
    match document {
        JsonValue::Array(items) => {
            let records = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    JsonValue::Object(object) => Ok(record(object)),
                    other => Err(Error::InvalidInput(format!(
                        "JSON record {} is not an object: {other}",
                        i + 1
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Table::from_records(records))
        },
        JsonValue::Object(object) if object.values().all(JsonValue::is_array) => {
            let columns = object
                .into_iter()
                .map(|(name, values)| {
                    let values = match values {
                        JsonValue::Array(items) => items.into_iter().map(to_value).collect(),
                        _ => Vec::new(),
                    };
                    (name, values)
                })
                .collect();
            table_from_columns(columns)
        },
        JsonValue::Object(object) => Ok(Table::from_records(vec![record(object)])),
        other => Err(Error::InvalidInput(format!(
            "JSON document must be an array of records or an object of columns, got {other}"
        ))),
    }
}

impl Importer for JsonFormat {
    fn import(&self, path: &Path, _options: &HandlerOptions) -> Result<Table> {
        let mut documents = serde_json::Deserializer::from_reader(open_reader(path)?)
            .into_iter::<JsonValue>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::operation("read_json", e))?;

        match documents.len() {
            0 => Ok(Table::default()),
            1 => table_from_document(documents.remove(0)),
            _ => {
                let records = documents
                    .into_iter()
                    .enumerate()
                    .map(|(line, document)| match document {
                        JsonValue::Object(object) => Ok(record(object)),
                        _ => Err(Error::InvalidInput(format!(
                            "JSON line {}: expected an object",
                            line + 1
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Table::from_records(records))
            },
        }
    }
}

impl Exporter for JsonFormat {
    fn export(&self, tables: &TableSet, path: &Path, options: &HandlerOptions) -> Result<()> {
        let table = single_table(tables, "json")?;
        let document = match options.get("orient").unwrap_or("records") {
            "records" => JsonValue::Array(
                table
                    .rows()
                    .map(|row| {
                        table
                            .column_names()
                            .into_iter()
                            .map(String::from)
                            .zip(row.into_iter().map(from_value))
                            .collect::<Map<_, _>>()
                    })
                    .map(JsonValue::Object)
                    .collect(),
            ),
            "columns" => JsonValue::Object(
                table
                    .columns()
                    .iter()
                    .map(|column| {
                        let values = (0..column.len())
                            .map(|i| from_value(column.data.get(i)))
                            .collect();
                        (column.name.clone(), JsonValue::Array(values))
                    })
                    .collect(),
            ),
            other => {
                return Err(Error::InvalidInput(format!(
                    "option 'orient' must be 'records' or 'columns', got '{other}'"
                )));
            },
        };

        let mut writer = create_writer(path)?;
        let written = if options.flag("pretty", false)? {
            serde_json::to_writer_pretty(&mut writer, &document)
        } else {
            serde_json::to_writer(&mut writer, &document)
        };
        written.map_err(|e| Error::operation("write_json", e))?;
        writeln!(writer)
            .and_then(|()| writer.flush())
            .map_err(|e| Error::operation("flush_json", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnData};
    use std::fs;
    use tempfile::TempDir;

    fn import_str(content: &str) -> Result<Table> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.json");
        fs::write(&path, content).unwrap();
        JsonFormat.import(&path, &HandlerOptions::new())
    }

    #[test]
    fn test_import_records() {
        let table = import_str(r#"[{"a": 1, "b": "x"}, {"a": 2.5}]"#).unwrap();
        assert_eq!(table.column_names(), vec!["a", "b"]);
        assert_eq!(
            table.column("a").map(|c| &c.data),
            Some(&ColumnData::Float(vec![Some(1.0), Some(2.5)]))
        );
        assert_eq!(table.row(1)[1], Value::Null);
    }

    #[test]
    fn test_import_columns() {
        let table = import_str(r#"{"a": [1, 2], "b": [true, null]}"#).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("b").map(|c| &c.data),
            Some(&ColumnData::Boolean(vec![Some(true), None]))
        );
    }

    #[test]
    fn test_import_ragged_columns_fails() {
        assert!(import_str(r#"{"a": [1, 2], "b": [1]}"#).is_err());
    }

    #[test]
    fn test_import_ndjson() {
        let table = import_str("{\"a\": 1}\n{\"a\": 2}\n").unwrap();
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_nested_values_become_text() {
        let table = import_str(r#"[{"a": {"k": 1}}]"#).unwrap();
        assert_eq!(table.row(0), vec![Value::Text(r#"{"k":1}"#.to_string())]);
    }

    #[test]
    fn test_export_orientations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let set = TableSet::single(
            Table::new(vec![
                Column::integers("a", [Some(1), None]),
                Column::text("b", [Some("x"), Some("y")]),
            ])
            .unwrap(),
        );

        JsonFormat.export(&set, &path, &HandlerOptions::new()).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "[{\"a\":1,\"b\":\"x\"},{\"a\":null,\"b\":\"y\"}]\n"
        );

        JsonFormat
            .export(&set, &path, &HandlerOptions::new().with("orient", "columns"))
            .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\"a\":[1,null],\"b\":[\"x\",\"y\"]}\n"
        );
    }
}
