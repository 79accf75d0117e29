//! Dataset type to Arrow type mapping and schema construction.

use arrow::datatypes::{DataType as ArrowType, Field, Schema, TimeUnit};

use sluice_core::{DataType, Dataset};

pub(crate) fn arrow_type(data_type: DataType) -> ArrowType {
    match data_type {
        DataType::Boolean => ArrowType::Boolean,
        DataType::Integer => ArrowType::Int64,
        DataType::Float => ArrowType::Float64,
        DataType::Text => ArrowType::Utf8,
        DataType::Timestamp => ArrowType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
    }
}

/// Every field is nullable; missing cells become Parquet nulls.
pub(crate) fn build_schema(ds: &Dataset) -> Schema {
    let fields: Vec<Field> = ds
        .columns()
        .iter()
        .map(|col| Field::new(col.name(), arrow_type(col.data_type()), true))
        .collect();
    Schema::new(fields)
}
