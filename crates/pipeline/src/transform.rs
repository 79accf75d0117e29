//! The fixed cleaning transform applied to every extracted dataset.
//!
//! Steps, in order:
//! 1. drop rows with a missing value in any column
//! 2. normalize column names (lowercase, spaces to underscores)
//! 3. stamp `processed_at` with one instant for the whole run
//! 4. stamp `pipeline_name` with the job name

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use sluice_core::{Column, Dataset, Value};

pub const PROCESSED_AT: &str = "processed_at";
pub const PIPELINE_NAME: &str = "pipeline_name";

pub fn normalize_column_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

#[derive(Debug, Clone)]
pub struct Transformer {
    pipeline_name: String,
    processed_at: DateTime<Utc>,
}

impl Transformer {
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self::at(pipeline_name, Utc::now())
    }

    /// Transformer with a fixed `processed_at`.
    pub fn at(pipeline_name: impl Into<String>, processed_at: DateTime<Utc>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            processed_at,
        }
    }

    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    /// Clean `ds` in place. Returns the number of rows dropped.
    pub fn apply(&self, ds: &mut Dataset) -> usize {
        let dropped = ds.drop_incomplete_rows();
        ds.rename_columns(normalize_column_name);

        let rows = ds.num_rows();
        set_constant(ds, Column::filled(PROCESSED_AT, Value::Timestamp(self.processed_at), rows));
        set_constant(
            ds,
            Column::filled(PIPELINE_NAME, Value::Text(self.pipeline_name.clone()), rows),
        );

        debug!(pipeline = %self.pipeline_name, dropped, rows, "Transformed");
        dropped
    }
}

fn set_constant(ds: &mut Dataset, column: Column) {
    let name = column.name().to_string();
    if let Err(e) = ds.set_column(column) {
        // Filled to num_rows, so lengths always agree.
        warn!(column = %name, error = %e, "Could not set column");
    }
}

/// Clean `ds`, stamping it with the current time.
pub fn transform(ds: Dataset, pipeline_name: &str) -> Dataset {
    transform_at(ds, pipeline_name, Utc::now())
}

pub fn transform_at(mut ds: Dataset, pipeline_name: &str, now: DateTime<Utc>) -> Dataset {
    Transformer::at(pipeline_name, now).apply(&mut ds);
    ds
}
