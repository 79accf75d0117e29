//! JSON response bodies to datasets.
//!
//! Accepted shapes:
//! - array of objects (one row per object, columns in first-seen key order)
//! - object of equal-length arrays (one column per key)
//! - array of scalars (single `value` column)

use std::collections::HashSet;

use serde_json::{Map, Value as Json};
use thiserror::Error;

use sluice_core::{Cell, Column, Dataset, DatasetError, Value};

#[derive(Debug, Error)]
pub enum JsonShapeError {
    #[error("unsupported JSON shape: {0}")]
    UnsupportedShape(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Convert one JSON value into a cell. Nested values keep their JSON text.
pub fn json_cell(value: Json) -> Cell {
    match value {
        Json::Null => None,
        Json::Bool(b) => Some(Value::Boolean(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        Json::String(s) => Some(Value::Text(s)),
        nested @ (Json::Array(_) | Json::Object(_)) => Some(Value::Text(nested.to_string())),
    }
}

pub fn dataset_from_json(body: Json) -> Result<Dataset, JsonShapeError> {
    match body {
        Json::Array(items) => from_array(items),
        Json::Object(map) => from_column_map(map),
        other => Err(JsonShapeError::UnsupportedShape(format!(
            "top-level {}",
            json_kind(&other)
        ))),
    }
}

fn from_array(items: Vec<Json>) -> Result<Dataset, JsonShapeError> {
    let objects = items.iter().filter(|v| v.is_object()).count();
    if objects == items.len() {
        let records = items
            .into_iter()
            .filter_map(|v| match v {
                Json::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        return from_records(records);
    }
    if objects > 0 {
        return Err(JsonShapeError::UnsupportedShape(
            "array mixing objects and scalars".into(),
        ));
    }
    let values = items.into_iter().map(json_cell).collect();
    Ok(Dataset::from_columns(vec![Column::infer("value", values)])?)
}

fn from_records(records: Vec<Map<String, Json>>) -> Result<Dataset, JsonShapeError> {
    let names: Vec<String> = {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut names = Vec::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.clone());
                }
            }
        }
        names
    };

    let mut columns: Vec<Vec<Cell>> = names.iter().map(|_| Vec::with_capacity(records.len())).collect();
    for mut record in records {
        for (name, column) in names.iter().zip(columns.iter_mut()) {
            column.push(record.remove(name).and_then(json_cell));
        }
    }

    Ok(Dataset::from_columns(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::infer(name, values))
            .collect(),
    )?)
}

fn from_column_map(map: Map<String, Json>) -> Result<Dataset, JsonShapeError> {
    let mut columns = Vec::with_capacity(map.len());
    for (name, values) in map {
        match values {
            Json::Array(items) => {
                columns.push(Column::infer(name, items.into_iter().map(json_cell).collect()))
            }
            other => {
                return Err(JsonShapeError::UnsupportedShape(format!(
                    "object field '{name}' is a {}, expected an array",
                    json_kind(&other)
                )))
            }
        }
    }
    Ok(Dataset::from_columns(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sluice_core::DataType;

    #[test]
    fn records_keep_first_seen_key_order() {
        let ds = dataset_from_json(json!([
            {"User Name": "alice", "id": 1},
            {"id": 2, "email": "bob@example.com"},
        ]))
        .unwrap();

        assert_eq!(ds.column_names(), vec!["User Name", "id", "email"]);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.column("User Name").unwrap().get(1), None);
        assert_eq!(ds.column("email").unwrap().get(0), None);
        assert_eq!(ds.column("id").unwrap().data_type(), DataType::Integer);
    }

    #[test]
    fn numbers_widen_and_nested_values_become_text() {
        let ds = dataset_from_json(json!([
            {"score": 1, "tags": ["a", "b"]},
            {"score": 2.5, "tags": null},
        ]))
        .unwrap();

        let score = ds.column("score").unwrap();
        assert_eq!(score.data_type(), DataType::Float);
        assert_eq!(score.get(0), Some(&Value::Float(1.0)));
        assert_eq!(ds.column("tags").unwrap().get(0), Some(&Value::Text("[\"a\",\"b\"]".into())));
        assert_eq!(ds.column("tags").unwrap().get(1), None);
    }

    #[test]
    fn column_oriented_object() {
        let ds = dataset_from_json(json!({"id": [1, 2, 3], "active": [true, false, null]})).unwrap();
        assert_eq!(ds.column_names(), vec!["id", "active"]);
        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.column("active").unwrap().data_type(), DataType::Boolean);
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = dataset_from_json(json!({"a": [1, 2], "b": [1]})).unwrap_err();
        assert!(matches!(err, JsonShapeError::Dataset(_)));
    }

    #[test]
    fn scalar_array_becomes_value_column() {
        let ds = dataset_from_json(json!(["x", "y"])).unwrap();
        assert_eq!(ds.column_names(), vec!["value"]);
        assert_eq!(ds.num_rows(), 2);
    }

    #[test]
    fn empty_array_is_empty_dataset() {
        let ds = dataset_from_json(json!([])).unwrap();
        assert_eq!(ds.num_columns(), 0);
        assert_eq!(ds.num_rows(), 0);
    }

    #[test]
    fn unsupported_shapes() {
        assert!(matches!(
            dataset_from_json(json!("hello")),
            Err(JsonShapeError::UnsupportedShape(_))
        ));
        assert!(matches!(
            dataset_from_json(json!({"count": 3})),
            Err(JsonShapeError::UnsupportedShape(_))
        ));
        assert!(matches!(
            dataset_from_json(json!([{"a": 1}, 2])),
            Err(JsonShapeError::UnsupportedShape(_))
        ));
    }
}
