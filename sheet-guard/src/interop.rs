//! Arrow export of cleaned tables.
//!
//! Column semantic types map onto Arrow types:
//!
//! | Semantic type            | Arrow type                    |
//! |--------------------------|-------------------------------|
//! | `Integer`                | `Int64`                       |
//! | `Float`, `Currency`      | `Float64`                     |
//! | `Boolean`                | `Boolean`                     |
//! | `Temporal` (dates only)  | `Date32`                      |
//! | `Temporal` (with times)  | `Timestamp(Millisecond)`      |
//! | text types and untyped   | `Utf8`                        |
//!
//! Missing cells become Arrow nulls. The semantic type is kept in the field
//! metadata under [`SEMANTIC_TYPE_KEY`].

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
    TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::Datelike;
use tracing::{debug, instrument};

use crate::core::{Column, SemanticType, Table, Value};
use crate::prelude::*;

/// Field metadata key holding the column's semantic type.
pub const SEMANTIC_TYPE_KEY: &str = "sheet_guard.semantic_type";

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Converts a table to an Arrow [`RecordBatch`].
///
/// # Examples
///
/// ```rust
/// use arrow::datatypes::DataType;
/// use sheet_guard::core::{Column, SemanticType, Table, Value};
/// use sheet_guard::interop::to_record_batch;
///
/// let table = Table::new(vec![Column::typed(
///     "units",
///     SemanticType::Integer,
///     vec![Value::Integer(3), Value::Missing],
/// )])
/// .unwrap();
///
/// let batch = to_record_batch(&table).unwrap();
/// assert_eq!(batch.schema().field(0).data_type(), &DataType::Int64);
/// assert_eq!(batch.column(0).null_count(), 1);
/// ```
#[instrument(skip_all, fields(rows = table.num_rows(), columns = table.num_columns()))]
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.num_columns());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.num_columns());

    for column in table.columns() {
        let array = column_array(column);
        let mut field = Field::new(&column.name, array.data_type().clone(), true);
        if let Some(ty) = column.semantic_type {
            field = field.with_metadata(HashMap::from([(
                SEMANTIC_TYPE_KEY.to_string(),
                ty.type_name().to_string(),
            )]));
        }
        fields.push(field);
        arrays.push(array);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(table.num_rows()));
    let batch = RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), arrays, &options)?;
    debug!(schema = ?batch.schema(), "Exported table to Arrow");
    Ok(batch)
}

/// Arrow type a column exports as.
pub fn arrow_type(column: &Column) -> DataType {
    match column.semantic_type {
        Some(SemanticType::Integer) => DataType::Int64,
        Some(SemanticType::Float | SemanticType::Currency) => DataType::Float64,
        Some(SemanticType::Boolean) => DataType::Boolean,
        Some(SemanticType::Temporal) => {
            if column.values.iter().any(|v| matches!(v, Value::DateTime(_))) {
                DataType::Timestamp(TimeUnit::Millisecond, None)
            } else {
                DataType::Date32
            }
        }
        Some(SemanticType::Categorical | SemanticType::FreeText) | None => DataType::Utf8,
    }
}

fn column_array(column: &Column) -> ArrayRef {
    let values = &column.values;
    match arrow_type(column) {
        DataType::Int64 => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            values.iter().map(Value::as_f64).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Boolean(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Date32 => Arc::new(Date32Array::from(
            values
                .iter()
                .map(|v| match v {
                    Value::Date(d) => Some(d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Timestamp(_, _) => Arc::new(TimestampMillisecondArray::from(
            values
                .iter()
                .map(|v| match v {
                    Value::DateTime(dt) => Some(dt.and_utc().timestamp_millis()),
                    Value::Date(d) => d
                        .and_hms_opt(0, 0, 0)
                        .map(|dt| dt.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| (!v.is_missing()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}
