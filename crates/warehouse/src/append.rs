//! Table creation and row appends.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::sqlite::SqlitePool;
use tracing::info;

use sluice_core::{DataType, Dataset, PipelineError, Value};

/// Quote an identifier for both PostgreSQL and SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn pg_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Integer => "BIGINT",
        DataType::Float => "DOUBLE PRECISION",
        DataType::Text => "TEXT",
        DataType::Timestamp => "TIMESTAMPTZ",
    }
}

fn sqlite_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Boolean => "BOOLEAN",
        DataType::Integer => "INTEGER",
        DataType::Float => "REAL",
        DataType::Text => "TEXT",
        DataType::Timestamp => "DATETIME",
    }
}

fn create_table_sql(table: &str, ds: &Dataset, sql_type: fn(DataType) -> &'static str) -> String {
    let columns: Vec<String> = ds
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_ident(c.name()), sql_type(c.data_type())))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        columns.join(", ")
    )
}

fn insert_sql(table: &str, ds: &Dataset, placeholder: fn(usize) -> String) -> String {
    let names: Vec<String> = ds.columns().iter().map(|c| quote_ident(c.name())).collect();
    let params: Vec<String> = (1..=ds.num_columns()).map(placeholder).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        params.join(", ")
    )
}

/// Bind one cell as the Rust type matching its column.
///
/// Columns are type-checked on construction, so a present value always
/// matches `data_type`.
macro_rules! bind_cell {
    ($query:expr, $data_type:expr, $cell:expr) => {
        match ($data_type, $cell) {
            (DataType::Boolean, Some(Value::Boolean(v))) => $query.bind(Some(*v)),
            (DataType::Boolean, _) => $query.bind(None::<bool>),
            (DataType::Integer, Some(Value::Integer(v))) => $query.bind(Some(*v)),
            (DataType::Integer, _) => $query.bind(None::<i64>),
            (DataType::Float, Some(Value::Float(v))) => $query.bind(Some(*v)),
            (DataType::Float, _) => $query.bind(None::<f64>),
            (DataType::Timestamp, Some(Value::Timestamp(v))) => $query.bind(Some(*v)),
            (DataType::Timestamp, _) => $query.bind(None::<DateTime<Utc>>),
            (DataType::Text, cell) => $query.bind(cell.map(|v| v.to_string())),
        }
    };
}

pub(crate) async fn append_postgres(
    pool: &PgPool,
    table: &str,
    ds: &Dataset,
) -> Result<u64, PipelineError> {
    let ddl = create_table_sql(table, ds, pg_type);
    let insert = insert_sql(table, ds, |i| format!("${i}"));

    let mut tx = pool.begin().await.map_err(PipelineError::query)?;
    sqlx::query(&ddl)
        .execute(&mut *tx)
        .await
        .map_err(PipelineError::query)?;

    let mut inserted = 0u64;
    for row in 0..ds.num_rows() {
        let mut query = sqlx::query(&insert);
        for column in ds.columns() {
            query = bind_cell!(query, column.data_type(), column.get(row));
        }
        inserted += query
            .execute(&mut *tx)
            .await
            .map_err(PipelineError::query)?
            .rows_affected();
    }
    tx.commit().await.map_err(PipelineError::query)?;

    info!(table, rows = inserted, "appended rows (postgres)");
    Ok(inserted)
}

pub(crate) async fn append_sqlite(
    pool: &SqlitePool,
    table: &str,
    ds: &Dataset,
) -> Result<u64, PipelineError> {
    let ddl = create_table_sql(table, ds, sqlite_type);
    let insert = insert_sql(table, ds, |_| "?".to_string());

    let mut tx = pool.begin().await.map_err(PipelineError::query)?;
    sqlx::query(&ddl)
        .execute(&mut *tx)
        .await
        .map_err(PipelineError::query)?;

    let mut inserted = 0u64;
    for row in 0..ds.num_rows() {
        let mut query = sqlx::query(&insert);
        for column in ds.columns() {
            query = bind_cell!(query, column.data_type(), column.get(row));
        }
        inserted += query
            .execute(&mut *tx)
            .await
            .map_err(PipelineError::query)?
            .rows_affected();
    }
    tx.commit().await.map_err(PipelineError::query)?;

    info!(table, rows = inserted, "appended rows (sqlite)");
    Ok(inserted)
}
