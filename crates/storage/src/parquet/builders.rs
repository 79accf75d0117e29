//! Build typed Arrow arrays from dataset columns.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder,
    TimestampMicrosecondBuilder,
};

use sluice_core::{Column, DataType, Value};

/// Build one Arrow array per column.
///
/// Columns are type-checked on construction, so a cell whose variant does not
/// match the column type cannot occur; it would be written as null.
pub(crate) fn build_arrays(columns: &[Column]) -> Vec<ArrayRef> {
    columns.iter().map(build_array).collect()
}

fn build_array(column: &Column) -> ArrayRef {
    let values = column.values();
    let len = values.len();

    match column.data_type() {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(len);
            for cell in values {
                match cell {
                    Some(Value::Boolean(v)) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Integer => {
            let mut builder = Int64Builder::with_capacity(len);
            for cell in values {
                match cell {
                    Some(Value::Integer(v)) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Float => {
            let mut builder = Float64Builder::with_capacity(len);
            for cell in values {
                match cell {
                    Some(Value::Float(v)) => builder.append_value(*v),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        DataType::Timestamp => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(len);
            for cell in values {
                match cell {
                    Some(Value::Timestamp(ts)) => builder.append_value(ts.timestamp_micros()),
                    _ => builder.append_null(),
                }
            }
            Arc::new(builder.finish().with_timezone("UTC"))
        }
        DataType::Text => {
            let mut builder = StringBuilder::with_capacity(len, len * 32);
            for cell in values {
                match cell {
                    Some(Value::Text(s)) => builder.append_value(s),
                    Some(other) => builder.append_value(other.to_string()),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
    }
}
