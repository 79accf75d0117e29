//! In-memory tabular data passed between pipeline stages.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s. Every column holds
//! cells of a single [`DataType`] and all columns have the same length, so a
//! row is the set of cells sharing one position.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DatasetError {
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}' is {expected} but holds a {found} value")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },
}

/// Logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Text,
    Timestamp,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Text => "text",
            DataType::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single non-missing cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Timestamp(_) => DataType::Timestamp,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert into `target`, which must be the value's own type, `Float`
    /// (from `Integer`) or `Text`.
    fn coerce(self, target: DataType) -> Value {
        match (self, target) {
            (Value::Integer(i), DataType::Float) => Value::Float(i as f64),
            (Value::Text(s), DataType::Text) => Value::Text(s),
            (v, DataType::Text) => Value::Text(v.to_string()),
            (v, _) => v,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            // Debug keeps the trailing ".0" on whole floats.
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Text(s) => f.write_str(s),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true)),
        }
    }
}

/// A cell is missing when `None`.
pub type Cell = Option<Value>;

fn normalize(cell: Cell) -> Cell {
    match cell {
        Some(Value::Float(x)) if x.is_nan() => None,
        other => other,
    }
}

/// Pick the narrowest type that holds every present value.
fn unify(values: &[Cell]) -> DataType {
    let mut seen: Option<DataType> = None;
    for value in values.iter().flatten() {
        let t = value.data_type();
        seen = Some(match seen {
            None => t,
            Some(prev) if prev == t => prev,
            Some(DataType::Integer | DataType::Float)
                if matches!(t, DataType::Integer | DataType::Float) =>
            {
                DataType::Float
            }
            Some(_) => return DataType::Text,
        });
    }
    seen.unwrap_or(DataType::Text)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: DataType,
    values: Vec<Cell>,
}

impl Column {
    /// Build a column whose present cells are all of `data_type`.
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        values: Vec<Cell>,
    ) -> Result<Self, DatasetError> {
        let name = name.into();
        let values: Vec<Cell> = values.into_iter().map(normalize).collect();
        if let Some(bad) = values
            .iter()
            .flatten()
            .find(|v| v.data_type() != data_type)
        {
            return Err(DatasetError::TypeMismatch {
                column: name,
                expected: data_type,
                found: bad.data_type(),
            });
        }
        Ok(Self {
            name,
            data_type,
            values,
        })
    }

    /// Build a column from loosely typed cells, widening to a common type.
    pub fn infer(name: impl Into<String>, values: Vec<Cell>) -> Self {
        let values: Vec<Cell> = values.into_iter().map(normalize).collect();
        let data_type = unify(&values);
        let values = values
            .into_iter()
            .map(|cell| cell.map(|v| v.coerce(data_type)))
            .collect();
        Self {
            name: name.into(),
            data_type,
            values,
        }
    }

    /// A column repeating `value` for `len` rows.
    pub fn filled(name: impl Into<String>, value: Value, len: usize) -> Self {
        Self {
            name: name.into(),
            data_type: value.data_type(),
            values: vec![Some(value); len],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row).and_then(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|c| c.is_none()).count()
    }

    fn retain_mask(&mut self, mask: &[bool]) {
        let mut idx = 0;
        self.values.retain(|_| {
            let keep = mask.get(idx).copied().unwrap_or(false);
            idx += 1;
            keep
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut ds = Self::new();
        for column in columns {
            ds.push_column(column)?;
        }
        Ok(ds)
    }

    /// Build a dataset from row-major cells, inferring each column's type.
    ///
    /// Every row must have exactly one cell per name.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DatasetError> {
        let mut columns: Vec<Vec<Cell>> = names.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(DatasetError::LengthMismatch {
                    column: format!("row {row_idx}"),
                    expected: names.len(),
                    actual: row.len(),
                });
            }
            for (col, cell) in columns.iter_mut().zip(row) {
                col.push(cell);
            }
        }
        Self::from_columns(
            names
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::infer(name, values))
                .collect(),
        )
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cells of one row in column order, `None` past the end.
    pub fn row(&self, idx: usize) -> Option<Vec<Option<&Value>>> {
        if idx >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.get(idx)).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Option<&Value>>> + '_ {
        (0..self.num_rows()).map(move |idx| self.columns.iter().map(|c| c.get(idx)).collect())
    }

    fn check_len(&self, column: &Column) -> Result<(), DatasetError> {
        if !self.columns.is_empty() && column.len() != self.num_rows() {
            return Err(DatasetError::LengthMismatch {
                column: column.name.clone(),
                expected: self.num_rows(),
                actual: column.len(),
            });
        }
        Ok(())
    }

    /// Append a column at the end.
    pub fn push_column(&mut self, column: Column) -> Result<(), DatasetError> {
        self.check_len(&column)?;
        self.columns.push(column);
        Ok(())
    }

    /// Replace the column with the same name in place, or append it.
    ///
    /// When several columns share the name (a rename can produce that), the
    /// first is replaced and the others are removed.
    pub fn set_column(&mut self, column: Column) -> Result<(), DatasetError> {
        match self.columns.iter().position(|c| c.name == column.name) {
            Some(pos) => {
                // Only the namesakes' length is free to change.
                if self.columns.iter().any(|c| c.name != column.name) {
                    self.check_len(&column)?;
                }
                let mut first = true;
                self.columns.retain(|c| {
                    if c.name != column.name {
                        return true;
                    }
                    std::mem::replace(&mut first, false)
                });
                self.columns[pos] = column;
                Ok(())
            }
            None => self.push_column(column),
        }
    }

    pub fn rename_columns(&mut self, mut rename: impl FnMut(&str) -> String) {
        for column in &mut self.columns {
            let renamed = rename(&column.name);
            column.name = renamed;
        }
    }

    pub fn row_has_missing(&self, idx: usize) -> bool {
        self.columns
            .iter()
            .any(|c| c.values.get(idx).map(Option::is_none).unwrap_or(false))
    }

    /// Keep rows whose mask entry is `true`; returns the number removed.
    pub fn retain_mask(&mut self, mask: &[bool]) -> usize {
        let before = self.num_rows();
        for column in &mut self.columns {
            column.retain_mask(mask);
        }
        before - self.num_rows()
    }

    /// Remove every row holding a missing cell; returns the number removed.
    pub fn drop_incomplete_rows(&mut self) -> usize {
        let mask: Vec<bool> = (0..self.num_rows())
            .map(|idx| !self.row_has_missing(idx))
            .collect();
        self.retain_mask(&mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Some(Value::Text(s.to_string()))
    }

    #[test]
    fn infer_widens_integers_to_float() {
        let col = Column::infer("amount", vec![Some(Value::Integer(2)), Some(Value::Float(2.5)), None]);
        assert_eq!(col.data_type(), DataType::Float);
        assert_eq!(col.get(0), Some(&Value::Float(2.0)));
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn infer_mixed_falls_back_to_text() {
        let col = Column::infer("x", vec![Some(Value::Integer(7)), text("seven"), Some(Value::Boolean(true))]);
        assert_eq!(col.data_type(), DataType::Text);
        assert_eq!(col.get(0), Some(&Value::Text("7".into())));
        assert_eq!(col.get(2), Some(&Value::Text("true".into())));
    }

    #[test]
    fn infer_all_missing_is_text() {
        let col = Column::infer("empty", vec![None, None]);
        assert_eq!(col.data_type(), DataType::Text);
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn nan_is_missing() {
        let col = Column::new("f", DataType::Float, vec![Some(Value::Float(f64::NAN)), Some(Value::Float(1.0))]).unwrap();
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn new_rejects_wrong_type() {
        let err = Column::new("id", DataType::Integer, vec![text("a")]).unwrap_err();
        assert_eq!(
            err,
            DatasetError::TypeMismatch {
                column: "id".into(),
                expected: DataType::Integer,
                found: DataType::Text,
            }
        );
    }

    #[test]
    fn push_column_checks_length() {
        let mut ds = Dataset::new();
        ds.push_column(Column::infer("a", vec![text("x"), text("y")])).unwrap();
        let err = ds.push_column(Column::infer("b", vec![text("z")])).unwrap_err();
        assert!(matches!(err, DatasetError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn set_column_replaces_in_place() {
        let mut ds = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![text("1"), text("2")]],
        )
        .unwrap();
        ds.set_column(Column::filled("a", Value::Integer(9), 1)).unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b"]);
        assert_eq!(ds.column("a").unwrap().data_type(), DataType::Integer);

        ds.set_column(Column::filled("c", Value::Boolean(false), 1)).unwrap();
        assert_eq!(ds.column_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn set_column_drops_namesakes() {
        let mut ds = Dataset::from_rows(
            vec!["Pipeline Name".into(), "id".into(), "pipeline_name".into()],
            vec![
                vec![text("old"), text("1"), text("stale")],
                vec![text("old"), text("2"), text("stale")],
            ],
        )
        .unwrap();
        ds.rename_columns(|name| name.to_lowercase().replace(' ', "_"));
        assert_eq!(ds.column_names(), vec!["pipeline_name", "id", "pipeline_name"]);

        ds.set_column(Column::filled("pipeline_name", Value::Text("fresh".into()), 2))
            .unwrap();
        assert_eq!(ds.column_names(), vec!["pipeline_name", "id"]);
        let stamp = ds.column("pipeline_name").unwrap();
        assert_eq!(stamp.get(0), Some(&Value::Text("fresh".into())));
        assert_eq!(stamp.get(1), Some(&Value::Text("fresh".into())));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = Dataset::from_rows(vec!["a".into(), "b".into()], vec![vec![text("1")]]).unwrap_err();
        assert!(matches!(err, DatasetError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn drop_incomplete_rows_keeps_order() {
        let mut ds = Dataset::from_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec![Some(Value::Integer(1)), text("a")],
                vec![Some(Value::Integer(2)), None],
                vec![None, text("c")],
                vec![Some(Value::Integer(4)), text("d")],
            ],
        )
        .unwrap();

        assert_eq!(ds.drop_incomplete_rows(), 2);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.row(0).unwrap(), vec![Some(&Value::Integer(1)), Some(&Value::Text("a".into()))]);
        assert_eq!(ds.row(1).unwrap(), vec![Some(&Value::Integer(4)), Some(&Value::Text("d".into()))]);
        assert!(ds.row(2).is_none());
    }

    #[test]
    fn empty_dataset_accepts_any_first_column() {
        let mut ds = Dataset::new();
        assert_eq!(ds.num_rows(), 0);
        ds.push_column(Column::infer("a", vec![])).unwrap();
        ds.push_column(Column::filled("b", Value::Integer(1), 0)).unwrap();
        assert_eq!(ds.num_columns(), 2);
        assert!(ds.is_empty());
    }

    #[test]
    fn value_display() {
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Integer(-4).to_string(), "-4");
        let ts = "2025-06-14T10:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2025-06-14T10:30:00.000000Z");
    }
}
