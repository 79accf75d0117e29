/// Errors that can occur while encoding a dataset as Parquet.
#[derive(Debug, thiserror::Error)]
pub enum ParquetError {
    /// Failed to assemble Arrow arrays into a record batch.
    #[error("Arrow conversion error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet write error: {0}")]
    Write(#[from] parquet::errors::ParquetError),
}
