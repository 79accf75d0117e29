//! Row decoding from sqlx result sets into dataset cells.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column as _, Executor, Row, TypeInfo, ValueRef};

use tracing::debug;

use sluice_core::{Cell, Column, DataType, Dataset, PipelineError, Value};

use crate::append::quote_ident;

/// Dataset type for a PostgreSQL column type name.
fn pg_data_type(type_name: &str) -> DataType {
    match type_name {
        "BOOL" => DataType::Boolean,
        "INT2" | "INT4" | "INT8" => DataType::Integer,
        "FLOAT4" | "FLOAT8" => DataType::Float,
        "TIMESTAMPTZ" | "TIMESTAMP" => DataType::Timestamp,
        _ => DataType::Text,
    }
}

fn pg_cell(row: &PgRow, idx: usize, type_name: &str) -> Result<Cell, sqlx::Error> {
    let cell = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Value::Boolean),
        "INT2" => row
            .try_get::<Option<i16>, _>(idx)?
            .map(|v| Value::Integer(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(idx)?
            .map(|v| Value::Integer(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Value::Integer),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(idx)?
            .map(|v| Value::Float(v.into())),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(Value::Float),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(Value::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| Value::Timestamp(v.and_utc())),
        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(|v| Value::Text(v.to_string())),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(idx)?
            .map(|v| Value::Text(v.to_string())),
        // TEXT, VARCHAR, BPCHAR, NAME, and columns cast to text by `pg_cast`.
        _ => row.try_get::<Option<String>, _>(idx)?.map(Value::Text),
    };
    Ok(cell)
}

/// Server-side cast for a column type `pg_cell` cannot decode, as the SQL
/// target type and the type name the cast column reports.
///
/// NUMERIC is read as double precision, matching pandas' float coercion of
/// decimals. Other types (UUID, TIME, INTERVAL, arrays, enums) are read as text.
fn pg_cast(type_name: &str) -> Option<(&'static str, &'static str)> {
    match type_name {
        "BOOL" | "INT2" | "INT4" | "INT8" | "FLOAT4" | "FLOAT8" | "TIMESTAMPTZ" | "TIMESTAMP"
        | "DATE" | "JSON" | "JSONB" | "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => None,
        "NUMERIC" => Some(("double precision", "FLOAT8")),
        _ => Some(("text", "TEXT")),
    }
}

/// Wrap `sql` in an outer select that applies the given casts by column name.
fn wrap_with_casts(sql: &str, columns: &[(String, Option<&str>)]) -> String {
    let select: Vec<String> = columns
        .iter()
        .map(|(name, cast)| {
            let ident = quote_ident(name);
            match cast {
                Some(target) => format!("{ident}::{target} AS {ident}"),
                None => ident,
            }
        })
        .collect();
    let inner = sql.trim().trim_end_matches(';');
    format!("SELECT {} FROM ({inner}) AS sluice_src", select.join(", "))
}

pub(crate) async fn query_postgres(pool: &PgPool, sql: &str) -> Result<Dataset, PipelineError> {
    let described: Vec<(String, String)> = pool
        .describe(sql)
        .await
        .map_err(PipelineError::query)?
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), c.type_info().name().to_string()))
        .collect();

    let casts: Vec<Option<(&str, &str)>> = described.iter().map(|(_, t)| pg_cast(t)).collect();
    let names: HashSet<&str> = described.iter().map(|(n, _)| n.as_str()).collect();
    // Columns can only be addressed by name when names are unique.
    let rewrite = casts.iter().any(Option::is_some) && names.len() == described.len();

    let query = if rewrite {
        let select: Vec<(String, Option<&str>)> = described
            .iter()
            .zip(&casts)
            .map(|((name, _), cast)| (name.clone(), cast.map(|(target, _)| target)))
            .collect();
        let wrapped = wrap_with_casts(sql, &select);
        debug!(sql = %wrapped, "Casting undecodable columns");
        wrapped
    } else {
        sql.to_string()
    };

    let rows = sqlx::query(&query)
        .fetch_all(pool)
        .await
        .map_err(PipelineError::query)?;

    let mut ds = Dataset::new();
    for (idx, ((name, type_name), cast)) in described.into_iter().zip(casts).enumerate() {
        let type_name = match cast {
            Some((_, reported)) if rewrite => reported.to_string(),
            _ => type_name,
        };
        let values = rows
            .iter()
            .map(|row| pg_cell(row, idx, &type_name))
            .collect::<Result<Vec<Cell>, _>>()
            .map_err(|e| PipelineError::Query(format!("column '{name}' ({type_name}): {e}")))?;
        let column = Column::new(name, pg_data_type(&type_name), values).map_err(PipelineError::query)?;
        ds.push_column(column).map_err(PipelineError::query)?;
    }
    Ok(ds)
}

fn sqlite_cell(row: &SqliteRow, idx: usize) -> Result<Cell, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(None);
    }
    // Declared column type; the value itself only knows its storage class.
    let declared = row.column(idx).type_info().name().to_ascii_uppercase();

    match declared.as_str() {
        "BOOLEAN" => {
            if let Ok(v) = row.try_get::<bool, _>(idx) {
                return Ok(Some(Value::Boolean(v)));
            }
        }
        "DATETIME" => {
            if let Ok(v) = row.try_get::<DateTime<Utc>, _>(idx) {
                return Ok(Some(Value::Timestamp(v)));
            }
        }
        _ => {}
    }

    // SQLite types values, not columns: try the storage classes in turn.
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Ok(Some(Value::Integer(v)));
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Ok(Some(Value::Float(v)));
    }
    row.try_get::<String, _>(idx).map(|v| Some(Value::Text(v)))
}

pub(crate) async fn query_sqlite(pool: &SqlitePool, sql: &str) -> Result<Dataset, PipelineError> {
    let rows = sqlx::query(sql)
        .fetch_all(pool)
        .await
        .map_err(PipelineError::query)?;

    let names: Vec<String> = match rows.first() {
        Some(first) => first.columns().iter().map(|c| c.name().to_string()).collect(),
        None => pool
            .describe(sql)
            .await
            .map_err(PipelineError::query)?
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
    };

    let mut ds = Dataset::new();
    for (idx, name) in names.into_iter().enumerate() {
        let values = rows
            .iter()
            .map(|row| sqlite_cell(row, idx))
            .collect::<Result<Vec<Cell>, _>>()
            .map_err(|e| PipelineError::Query(format!("column '{name}': {e}")))?;
        ds.push_column(Column::infer(name, values))
            .map_err(PipelineError::query)?;
    }
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pg_type_mapping() {
        assert_eq!(pg_data_type("INT4"), DataType::Integer);
        assert_eq!(pg_data_type("INT8"), DataType::Integer);
        assert_eq!(pg_data_type("FLOAT8"), DataType::Float);
        assert_eq!(pg_data_type("BOOL"), DataType::Boolean);
        assert_eq!(pg_data_type("TIMESTAMPTZ"), DataType::Timestamp);
        assert_eq!(pg_data_type("DATE"), DataType::Text);
        assert_eq!(pg_data_type("VARCHAR"), DataType::Text);
        assert_eq!(pg_data_type("JSONB"), DataType::Text);
    }

    #[test]
    fn undecodable_types_are_cast() {
        assert_eq!(pg_cast("NUMERIC"), Some(("double precision", "FLOAT8")));
        assert_eq!(pg_cast("UUID"), Some(("text", "TEXT")));
        assert_eq!(pg_cast("TIME"), Some(("text", "TEXT")));
        assert_eq!(pg_cast("INTERVAL"), Some(("text", "TEXT")));
        assert_eq!(pg_cast("INT4[]"), Some(("text", "TEXT")));
        for native in ["BOOL", "INT8", "FLOAT8", "TIMESTAMPTZ", "DATE", "JSONB", "VARCHAR", "TEXT"] {
            assert_eq!(pg_cast(native), None, "{native}");
        }

        // Cast columns land on a decodable type.
        let (_, reported) = pg_cast("NUMERIC").unwrap();
        assert_eq!(pg_data_type(reported), DataType::Float);
        let (_, reported) = pg_cast("UUID").unwrap();
        assert_eq!(pg_data_type(reported), DataType::Text);
    }

    #[test]
    fn wraps_query_with_casts() {
        let columns = vec![
            ("id".to_string(), Some("text")),
            ("amount".to_string(), Some("double precision")),
            ("Odd \"name\"".to_string(), None),
        ];
        let sql = wrap_with_casts(" SELECT * FROM payments; ", &columns);
        assert_eq!(
            sql,
            "SELECT \"id\"::text AS \"id\", \"amount\"::double precision AS \"amount\", \"Odd \"\"name\"\"\" FROM (SELECT * FROM payments) AS sluice_src"
        );
    }
}
