//! Encode a [`Dataset`](sluice_core::Dataset) as an Apache Parquet file.
//!
//! Column types map one-to-one onto Arrow types, so downstream readers see
//! integers, floats and timestamps rather than strings. Files are Zstd
//! compressed and carry `sluice.*` key/value metadata in the footer.

mod builders;
mod error;
pub(crate) mod schema;
mod writer;

pub use error::ParquetError;
pub use writer::{dataset_to_record_batch, write_parquet};
