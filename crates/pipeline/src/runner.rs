use std::time::{Duration, Instant};

use tracing::{info, warn};

use sluice_core::{Config, JobConfig, PipelineError};
use sluice_ingest::SourceResolver;
use sluice_storage::{DestinationWriter, LoadReceipt, ObjectStores};
use sluice_warehouse::Warehouse;

use crate::transform::Transformer;

/// Collaborators shared by every job of a batch.
pub struct PipelineContext {
    pub resolver: SourceResolver,
    pub writer: DestinationWriter,
    warehouse: Option<Warehouse>,
}

impl PipelineContext {
    pub fn new(resolver: SourceResolver, writer: DestinationWriter) -> Self {
        Self {
            resolver,
            writer,
            warehouse: None,
        }
    }

    /// Wire the resolver and writer from configuration.
    ///
    /// The warehouse pool connects lazily. An unusable `DATABASE_URL` is
    /// logged and leaves `sql://` and `table://` jobs failing with `Query`.
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_stores(config, ObjectStores::new(&config.aws))
    }

    pub fn from_config_with_stores(config: &Config, stores: ObjectStores) -> Self {
        let warehouse = match Warehouse::connect_lazy(&config.database) {
            Ok(wh) => Some(wh),
            Err(e) => {
                warn!(error = %e, "Warehouse unavailable");
                None
            }
        };
        Self {
            resolver: SourceResolver::new(&config.http, warehouse.clone()),
            writer: DestinationWriter::new(stores, config.staging.dir.clone(), warehouse.clone()),
            warehouse,
        }
    }

    pub async fn close(&self) {
        if let Some(wh) = &self.warehouse {
            wh.close().await;
        }
    }
}

/// Outcome of one successful job run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job: String,
    pub rows_extracted: usize,
    pub rows_loaded: u64,
    pub receipt: LoadReceipt,
    pub elapsed: Duration,
}

/// Runs a single job: extract, transform, load.
pub struct PipelineRunner<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&self, job: &JobConfig) -> Result<RunSummary, PipelineError> {
        let start = Instant::now();
        info!(job = %job.name, source = %job.source, destination = %job.destination, "Running pipeline");

        let mut ds = self.ctx.resolver.extract(&job.source).await?;
        let rows_extracted = ds.num_rows();
        info!(job = %job.name, rows = rows_extracted, "Extracted {} rows", rows_extracted);

        Transformer::new(&job.name).apply(&mut ds);
        info!(job = %job.name, rows = ds.num_rows(), "Transformed {} rows", ds.num_rows());

        let receipt = self.ctx.writer.load(&ds, &job.destination).await?;
        let elapsed = start.elapsed();
        info!(
            job = %job.name,
            rows = receipt.rows,
            destination = %receipt.destination,
            "Loaded in {:.2}s",
            elapsed.as_secs_f64()
        );

        Ok(RunSummary {
            job: job.name.clone(),
            rows_extracted,
            rows_loaded: receipt.rows,
            receipt,
            elapsed,
        })
    }
}
