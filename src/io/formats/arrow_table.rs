//! Conversion between [`Table`] and Arrow record batches.
//!
//! Shared by the parquet and feather handlers. Column metadata travels as
//! JSON in the Arrow field metadata under [`META_KEY`]; fields written by
//! other tools get their Arrow type recorded as the storage type.

use crate::models::{Column, ColumnData, ColumnMeta, Table, TableMeta};
use crate::{Error, Result};
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::compute::kernels::cast::{CastOptions, cast_with_options};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::HashMap;
use std::sync::Arc;

/// Field metadata key holding serialized [`ColumnMeta`].
pub const META_KEY: &str = "tabport.meta";
/// Schema metadata key holding the table name.
pub const NAME_KEY: &str = "tabport.name";

fn data_type(data: &ColumnData) -> DataType {
    match data {
        ColumnData::Integer(_) => DataType::Int64,
        ColumnData::Float(_) => DataType::Float64,
        ColumnData::Boolean(_) => DataType::Boolean,
        ColumnData::Text(_) => DataType::Utf8,
    }
}

fn array(data: &ColumnData) -> ArrayRef {
    match data {
        ColumnData::Integer(v) => Arc::new(Int64Array::from(v.clone())),
        ColumnData::Float(v) => Arc::new(Float64Array::from(v.clone())),
        ColumnData::Boolean(v) => Arc::new(BooleanArray::from(v.clone())),
        ColumnData::Text(v) => Arc::new(v.iter().map(Option::as_deref).collect::<StringArray>()),
    }
}

/// Builds the Arrow schema for a table, metadata included.
///
/// # Errors
///
/// Returns an error if column metadata cannot be serialized.
pub fn schema(table: &Table) -> Result<SchemaRef> {
    let fields = table
        .columns()
        .iter()
        .map(|column| {
            let field = Field::new(column.name.as_str(), data_type(&column.data), true);
            if column.meta.is_empty() {
                return Ok(field);
            }
            let meta = serde_json::to_string(&column.meta)
                .map_err(|e| Error::operation("encode_column_meta", e))?;
            Ok(field.with_metadata(HashMap::from([(META_KEY.to_string(), meta)])))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut schema_meta = HashMap::new();
    if let Some(name) = &table.meta.name {
        schema_meta.insert(NAME_KEY.to_string(), name.clone());
    }
    Ok(Arc::new(Schema::new_with_metadata(fields, schema_meta)))
}

/// Converts a table into a single record batch.
///
/// # Errors
///
/// Returns an error if Arrow rejects the batch.
pub fn to_batch(table: &Table, schema: SchemaRef) -> Result<RecordBatch> {
    let columns = table.columns().iter().map(|c| array(&c.data)).collect();
    let options = RecordBatchOptions::new().with_row_count(Some(table.n_rows()));
    RecordBatch::try_new_with_options(schema, columns, &options)
        .map_err(|e| Error::operation("build_record_batch", e))
}

fn target_type(source: &DataType) -> DataType {
    match source {
        DataType::Boolean => DataType::Boolean,
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Decimal128(_, _)
        | DataType::Decimal256(_, _) => DataType::Float64,
        _ => DataType::Utf8,
    }
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef, name: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| Error::operation("read_arrow_column", format!("unexpected array type for '{name}'")))
}

fn column_data(field: &Field, chunks: &[ArrayRef]) -> Result<ColumnData> {
    let target = target_type(field.data_type());
    let name = field.name();
    // Values that do not fit the widened type are an error, never a null.
    let options = CastOptions {
        safe: false,
        ..CastOptions::default()
    };
    let cast_chunks = chunks
        .iter()
        .map(|chunk| {
            cast_with_options(chunk, &target, &options)
                .map_err(|e| Error::operation("cast_arrow_column", format!("column '{name}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(match target {
        DataType::Int64 => {
            let mut values = Vec::new();
            for chunk in &cast_chunks {
                values.extend(downcast::<Int64Array>(chunk, name)?.iter());
            }
            ColumnData::Integer(values)
        },
        DataType::Float64 => {
            let mut values = Vec::new();
            for chunk in &cast_chunks {
                values.extend(downcast::<Float64Array>(chunk, name)?.iter());
            }
            ColumnData::Float(values)
        },
        DataType::Boolean => {
            let mut values = Vec::new();
            for chunk in &cast_chunks {
                values.extend(downcast::<BooleanArray>(chunk, name)?.iter());
            }
            ColumnData::Boolean(values)
        },
        _ => {
            let mut values = Vec::new();
            for chunk in &cast_chunks {
                values.extend(
                    downcast::<StringArray>(chunk, name)?
                        .iter()
                        .map(|v| v.map(String::from)),
                );
            }
            ColumnData::Text(values)
        },
    })
}

fn column_meta(field: &Field) -> ColumnMeta {
    field
        .metadata()
        .get(META_KEY)
        .and_then(|raw| serde_json::from_str::<ColumnMeta>(raw).ok())
        .unwrap_or_else(|| ColumnMeta {
            storage_type: Some(field.data_type().to_string().to_lowercase()),
            ..ColumnMeta::default()
        })
}

/// Converts record batches sharing `schema` back into a table.
///
/// # Errors
///
/// Returns an error if a column cannot be cast to a supported type.
pub fn from_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Table> {
    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let chunks: Vec<ArrayRef> = batches.iter().map(|b| Arc::clone(b.column(i))).collect();
            Ok(Column::new(field.name().clone(), column_data(field, &chunks)?)
                .with_meta(column_meta(field)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Table::new(columns)?.with_meta(TableMeta {
        name: schema.metadata().get(NAME_KEY).cloned(),
        ..TableMeta::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, UInt64Array};

    #[test]
    fn test_batch_roundtrip_keeps_labels() {
        let table = Table::new(vec![
            Column::integers("a", [Some(1), None])
                .with_meta(ColumnMeta::default().with_label("Answer")),
            Column::text("b", [Some("x"), Some("y")]),
        ])
        .unwrap();

        let schema = schema(&table).unwrap();
        let batch = to_batch(&table, Arc::clone(&schema)).unwrap();
        let back = from_batches(&schema, &[batch]).unwrap();

        assert!(back.same_data(&table));
        assert_eq!(
            back.column("a").and_then(|c| c.meta.label.as_deref()),
            Some("Answer")
        );
    }

    #[test]
    fn test_foreign_types_are_widened() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int32, true)]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![Arc::new(Int32Array::from(vec![Some(7), None]))],
        )
        .unwrap();

        let table = from_batches(&schema, &[batch.clone(), batch]).unwrap();
        assert_eq!(
            table.column("n").map(|c| &c.data),
            Some(&ColumnData::Integer(vec![Some(7), None, Some(7), None]))
        );
        assert_eq!(
            table.column("n").and_then(|c| c.meta.storage_type.as_deref()),
            Some("int32")
        );
    }

    #[test]
    fn test_unsigned_overflow_is_an_error() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::UInt64, true)]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![Arc::new(UInt64Array::from(vec![Some(1), None, Some(u64::MAX)]))],
        )
        .unwrap();

        let err = from_batches(&schema, &[batch]).unwrap_err();
        assert!(matches!(err, Error::OperationFailed { .. }), "{err:?}");
        assert!(err.to_string().contains("'n'"));
    }

    #[test]
    fn test_unsigned_in_range_is_kept() {
        let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::UInt64, true)]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![Arc::new(UInt64Array::from(vec![Some(1), None]))],
        )
        .unwrap();

        let table = from_batches(&schema, &[batch]).unwrap();
        assert_eq!(
            table.column("n").map(|c| &c.data),
            Some(&ColumnData::Integer(vec![Some(1), None]))
        );
    }

    #[test]
    fn test_zero_column_batch_keeps_row_count() {
        let table = Table::default();
        let schema = schema(&table).unwrap();
        assert_eq!(to_batch(&table, schema).unwrap().num_rows(), 0);
    }
}
