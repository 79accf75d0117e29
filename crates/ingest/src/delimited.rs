//! Local CSV files to datasets.

use std::path::Path;

use tracing::debug;

use sluice_core::{Column, DataType, Dataset, PipelineError, Value};

/// Field values read as missing. Matched exactly; padded tokens are data.
const NA_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "null", "NULL", "None", "#N/A", "<NA>",
];

fn is_na(field: &str) -> bool {
    NA_TOKENS.contains(&field)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_as(raw: &str, data_type: DataType) -> Option<Value> {
    match data_type {
        DataType::Integer => raw.trim().parse().ok().map(Value::Integer),
        DataType::Float => raw.trim().parse().ok().map(Value::Float),
        DataType::Boolean => parse_bool(raw).map(Value::Boolean),
        _ => Some(Value::Text(raw.to_string())),
    }
}

/// Type a column of raw fields: integer, then float, then boolean, else text.
fn infer_column(name: String, raw: Vec<Option<String>>) -> Column {
    let present: Vec<&str> = raw.iter().flatten().map(String::as_str).collect();
    let data_type = if present.is_empty() {
        DataType::Text
    } else if present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        DataType::Integer
    } else if present.iter().all(|s| s.trim().parse::<f64>().is_ok()) {
        DataType::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        DataType::Boolean
    } else {
        DataType::Text
    };

    let values = raw
        .into_iter()
        .map(|field| field.and_then(|s| parse_as(&s, data_type)))
        .collect();
    Column::infer(name, values)
}

/// Read a headed CSV file. Missing or malformed files fail with `Io`.
pub fn read_csv(path: &Path) -> Result<Dataset, PipelineError> {
    let io_err = |e: csv::Error| PipelineError::io(path.display(), e);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(io_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(io_err)?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        return Err(PipelineError::io(path.display(), "missing header row"));
    }

    let mut fields: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(io_err)?;
        for (column, field) in fields.iter_mut().zip(record.iter()) {
            column.push(if is_na(field) { None } else { Some(field.to_string()) });
        }
    }

    let columns = headers
        .into_iter()
        .zip(fields)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();
    let ds = Dataset::from_columns(columns).map_err(|e| PipelineError::io(path.display(), e))?;
    debug!(path = %path.display(), rows = ds.num_rows(), columns = ds.num_columns(), "read csv");
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn infers_column_types() {
        let file = write_tmp("id,price,active,name\n1,9.99,true,Widget\n2,5,False,Gadget\n");
        let ds = read_csv(file.path()).unwrap();

        assert_eq!(ds.column_names(), vec!["id", "price", "active", "name"]);
        assert_eq!(ds.column("id").unwrap().data_type(), DataType::Integer);
        assert_eq!(ds.column("price").unwrap().data_type(), DataType::Float);
        assert_eq!(ds.column("price").unwrap().get(1), Some(&Value::Float(5.0)));
        assert_eq!(ds.column("active").unwrap().data_type(), DataType::Boolean);
        assert_eq!(ds.column("active").unwrap().get(1), Some(&Value::Boolean(false)));
        assert_eq!(ds.column("name").unwrap().data_type(), DataType::Text);
    }

    #[test]
    fn na_tokens_are_missing() {
        let file = write_tmp("a,b\n1,\nNA,x\n3,null\n");
        let ds = read_csv(file.path()).unwrap();

        assert_eq!(ds.num_rows(), 3);
        assert_eq!(ds.column("a").unwrap().null_count(), 1);
        assert_eq!(ds.column("a").unwrap().data_type(), DataType::Integer);
        assert_eq!(ds.column("b").unwrap().null_count(), 2);
    }

    #[test]
    fn whitespace_fields_are_kept() {
        let file = write_tmp("id,note\n1, \n2,x\n");
        let ds = read_csv(file.path()).unwrap();

        let note = ds.column("note").unwrap();
        assert_eq!(note.null_count(), 0);
        assert_eq!(note.get(0), Some(&Value::Text(" ".into())));
        assert_eq!(ds.num_rows(), 2);
    }

    #[test]
    fn header_only_file_has_zero_rows() {
        let file = write_tmp("Order ID,Total\n");
        let ds = read_csv(file.path()).unwrap();
        assert_eq!(ds.column_names(), vec!["Order ID", "Total"]);
        assert_eq!(ds.num_rows(), 0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }), "{err:?}");
    }

    #[test]
    fn ragged_rows_are_io_error() {
        let file = write_tmp("a,b\n1,2\n3\n");
        let err = read_csv(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }), "{err:?}");
    }

    #[test]
    fn empty_file_is_io_error() {
        let file = write_tmp("");
        let err = read_csv(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::Io { .. }), "{err:?}");
    }
}
