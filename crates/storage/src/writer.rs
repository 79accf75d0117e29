use std::path::{Path, PathBuf};

use object_store::path::Path as ObjectPath;
use tracing::{info, warn};

use sluice_core::{Dataset, DestinationDescriptor, PipelineError};
use sluice_warehouse::Warehouse;

use crate::backend::ObjectStores;
use crate::csv_sink::write_csv;
use crate::parquet::write_parquet;

/// What a successful load wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReceipt {
    pub destination: String,
    pub rows: u64,
    /// Size of the written file or object; `None` for table appends.
    pub bytes: Option<u64>,
}

/// Persists datasets to S3 (Parquet), local CSV files, or warehouse tables.
#[derive(Debug, Clone)]
pub struct DestinationWriter {
    stores: ObjectStores,
    staging_dir: PathBuf,
    warehouse: Option<Warehouse>,
}

impl DestinationWriter {
    pub fn new(stores: ObjectStores, staging_dir: impl Into<PathBuf>, warehouse: Option<Warehouse>) -> Self {
        Self {
            stores,
            staging_dir: staging_dir.into(),
            warehouse,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Parse `descriptor` and load `ds` into it.
    pub async fn load(&self, ds: &Dataset, descriptor: &str) -> Result<LoadReceipt, PipelineError> {
        let destination = DestinationDescriptor::parse(descriptor)?;
        self.load_to(ds, &destination).await
    }

    pub async fn load_to(
        &self,
        ds: &Dataset,
        destination: &DestinationDescriptor,
    ) -> Result<LoadReceipt, PipelineError> {
        info!(kind = destination.kind(), destination = %destination, rows = ds.num_rows(), "Loading");
        let receipt = match destination {
            DestinationDescriptor::ObjectStore { bucket, key } => {
                let bytes = self.upload_parquet(ds, bucket, key).await?;
                LoadReceipt {
                    destination: destination.to_string(),
                    rows: ds.num_rows() as u64,
                    bytes: Some(bytes),
                }
            }
            DestinationDescriptor::LocalFile { path } => {
                let bytes = write_csv(ds, path)?;
                LoadReceipt {
                    destination: destination.to_string(),
                    rows: ds.num_rows() as u64,
                    bytes: Some(bytes),
                }
            }
            DestinationDescriptor::Table { name } => {
                let warehouse = self.warehouse.as_ref().ok_or_else(|| {
                    PipelineError::Query(format!("no warehouse configured for table '{name}'"))
                })?;
                let rows = warehouse.append_dataset(name, ds).await?;
                LoadReceipt {
                    destination: destination.to_string(),
                    rows,
                    bytes: None,
                }
            }
        };
        Ok(receipt)
    }

    /// Stage `ds` as a Parquet file, upload it to `bucket/key`, return its size.
    ///
    /// The store is resolved before anything is written; the staged file is
    /// removed when this returns, whatever the outcome.
    async fn upload_parquet(&self, ds: &Dataset, bucket: &str, key: &str) -> Result<u64, PipelineError> {
        let store = self.stores.resolve(bucket)?;

        let staging = self.staging_dir.display().to_string();
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| PipelineError::io(&staging, e))?;
        let mut staged = tempfile::Builder::new()
            .prefix("sluice-")
            .suffix(".parquet")
            .tempfile_in(&self.staging_dir)
            .map_err(|e| PipelineError::io(&staging, e))?;
        let staged_path = staged.path().display().to_string();

        write_parquet(
            ds,
            staged.as_file_mut(),
            &[
                ("destination", format!("s3://{bucket}/{key}")),
                ("rows", ds.num_rows().to_string()),
            ],
        )
        .map_err(|e| PipelineError::io(&staged_path, e))?;

        let data = tokio::fs::read(staged.path())
            .await
            .map_err(|e| PipelineError::io(&staged_path, e))?;
        let size = data.len() as u64;

        let location = ObjectPath::from(key);
        store
            .put(&location, bytes::Bytes::from(data).into())
            .await
            .map_err(|e| PipelineError::Storage(format!("upload to s3://{bucket}/{key} failed: {e}")))?;

        if let Err(e) = staged.close() {
            warn!(path = %staged_path, error = %e, "Failed to remove staged Parquet file");
        }
        info!(bucket, key, bytes = size, "Uploaded Parquet");
        Ok(size)
    }
}
