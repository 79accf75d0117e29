use std::io::Write;
use std::sync::Arc;

use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use tracing::debug;

use sluice_core::Dataset;

use super::builders::build_arrays;
use super::error::ParquetError;
use super::schema::build_schema;

/// Convert a [`Dataset`] into an Arrow [`RecordBatch`].
pub fn dataset_to_record_batch(ds: &Dataset) -> Result<RecordBatch, ParquetError> {
    let schema = Arc::new(build_schema(ds));
    let arrays = build_arrays(ds.columns());
    let options = RecordBatchOptions::new().with_row_count(Some(ds.num_rows()));
    Ok(RecordBatch::try_new_with_options(schema, arrays, &options)?)
}

/// Write `ds` as a Zstd-compressed Parquet file into `sink`.
///
/// `metadata` pairs are stored in the footer as `sluice.<key>`. Returns the
/// number of rows written.
pub fn write_parquet<W: Write + Send>(
    ds: &Dataset,
    sink: W,
    metadata: &[(&str, String)],
) -> Result<u64, ParquetError> {
    let batch = dataset_to_record_batch(ds)?;
    let row_count = batch.num_rows() as u64;

    let kv = metadata
        .iter()
        .map(|(key, value)| KeyValue::new(format!("sluice.{key}"), Some(value.clone())))
        .collect();
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(Default::default()))
        .set_key_value_metadata(Some(kv))
        .build();

    let mut writer = ArrowWriter::try_new(sink, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    debug!(rows = row_count, columns = ds.num_columns(), "Wrote Parquet");
    Ok(row_count)
}
