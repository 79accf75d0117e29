//! Destination writing: S3 Parquet objects, local CSV files, warehouse tables.

pub mod backend;
pub mod csv_sink;
pub mod parquet;
mod writer;

pub use backend::ObjectStores;
pub use writer::{DestinationWriter, LoadReceipt};
