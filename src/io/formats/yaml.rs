//! YAML adapter.
//!
//! Import accepts a sequence of mappings, a mapping of sequences (columns),
//! or a document stream where each document is one record. Export always
//! writes a single sequence of mappings.

use super::{create_writer, open_reader, table_from_columns};
use crate::io::traits::{Exporter, HandlerOptions, Importer, single_table};
use crate::models::{Table, TableSet, Value};
use crate::{Error, Result};
use serde::Deserialize;
use serde_yaml_ng::{Mapping, Value as YamlValue};
use std::io::{Read, Write};
use std::path::Path;

/// YAML handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

fn key_name(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        other => serde_yaml_ng::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn to_value(yaml: YamlValue) -> Value {
    match yaml {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Boolean(b),
        YamlValue::Number(n) => n
            .as_i64()
            .map(Value::Integer)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        YamlValue::String(s) => Value::Text(s),
        YamlValue::Tagged(tagged) => to_value(tagged.value),
        nested @ (YamlValue::Sequence(_) | YamlValue::Mapping(_)) => {
            Value::Text(key_name(nested))
        },
    }
}

fn from_value(value: Value) -> YamlValue {
    match value {
        Value::Null => YamlValue::Null,
        Value::Boolean(b) => YamlValue::Bool(b),
        Value::Integer(i) => YamlValue::Number(i.into()),
        Value::Float(f) => YamlValue::Number(f.into()),
        Value::Text(s) => YamlValue::String(s),
    }
}

fn record(mapping: Mapping) -> Vec<(String, Value)> {
    mapping
        .into_iter()
        .map(|(k, v)| (key_name(k), to_value(v)))
        .collect()
}

fn expect_mapping(value: YamlValue, position: usize) -> Result<Vec<(String, Value)>> {
    match value {
        YamlValue::Mapping(mapping) => Ok(record(mapping)),
        _ => Err(Error::InvalidInput(format!(
            "YAML record {position} is not a mapping"
        ))),
    }
}

fn table_from_document(document: YamlValue) -> Result<Table> {
    match document {
        YamlValue::Sequence(items) => {
            let records = items
                .into_iter()
                .enumerate()
                .map(|(i, item)| expect_mapping(item, i + 1))
                .collect::<Result<Vec<_>>>()?;
            Ok(Table::from_records(records))
        },
        YamlValue::Mapping(mapping) if mapping.values().all(YamlValue::is_sequence) => {
            let columns = mapping
                .into_iter()
                .map(|(name, values)| {
                    let values = match values {
                        YamlValue::Sequence(items) => items.into_iter().map(to_value).collect(),
                        _ => Vec::new(),
                    };
                    (key_name(name), values)
                })
                .collect();
            table_from_columns(columns)
        },
        YamlValue::Mapping(mapping) => Ok(Table::from_records(vec![record(mapping)])),
        YamlValue::Null => Ok(Table::default()),
        _ => Err(Error::InvalidInput(
            "YAML document must be a sequence of records or a mapping of columns".to_string(),
        )),
    }
}

impl Importer for YamlFormat {
    fn import(&self, path: &Path, _options: &HandlerOptions) -> Result<Table> {
        let mut content = String::new();
        open_reader(path)?
            .read_to_string(&mut content)
            .map_err(|e| Error::operation("read_yaml", e))?;

        let mut documents = Vec::new();
        for (index, document) in serde_yaml_ng::Deserializer::from_str(&content).enumerate() {
            let value = YamlValue::deserialize(document).map_err(|e| {
                Error::operation("read_yaml", format!("document {}: {e}", index + 1))
            })?;
            if !value.is_null() {
                documents.push(value);
            }
        }

        match documents.len() {
            0 => Ok(Table::default()),
            1 => table_from_document(documents.remove(0)),
            _ => {
                let records = documents
                    .into_iter()
                    .enumerate()
                    .map(|(i, document)| expect_mapping(document, i + 1))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Table::from_records(records))
            },
        }
    }
}

impl Exporter for YamlFormat {
    fn export(&self, tables: &TableSet, path: &Path, _options: &HandlerOptions) -> Result<()> {
        let table = single_table(tables, "yaml")?;
        let names = table.column_names();
        let records: Vec<YamlValue> = table
            .rows()
            .map(|row| {
                let mut mapping = Mapping::new();
                for (name, value) in names.iter().zip(row) {
                    mapping.insert(YamlValue::String((*name).to_string()), from_value(value));
                }
                YamlValue::Mapping(mapping)
            })
            .collect();

        let mut writer = create_writer(path)?;
        serde_yaml_ng::to_writer(&mut writer, &YamlValue::Sequence(records))
            .map_err(|e| Error::operation("write_yaml", e))?;
        writer
            .flush()
            .map_err(|e| Error::operation("flush_yaml", e))?;
        Ok(())
    }
}
