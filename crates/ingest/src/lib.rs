//! Source resolution: turn a source descriptor into a [`Dataset`].
//!
//! Three kinds of source are supported:
//! - HTTP(S) endpoints returning JSON
//! - local CSV files
//! - `sql://` read queries against the configured warehouse

mod delimited;
mod http;
pub mod json;

use std::time::Duration;

use reqwest::Client;
use tracing::info;

use sluice_core::config::HttpConfig;
use sluice_core::{Dataset, PipelineError, SourceDescriptor};
use sluice_warehouse::Warehouse;

pub use delimited::read_csv;

pub struct SourceResolver {
    client: Client,
    api_key: Option<String>,
    warehouse: Option<Warehouse>,
}

impl SourceResolver {
    pub fn new(config: &HttpConfig, warehouse: Option<Warehouse>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: config.api_key.clone(),
            warehouse,
        }
    }

    /// Parse `descriptor` and extract it.
    pub async fn extract(&self, descriptor: &str) -> Result<Dataset, PipelineError> {
        let source = SourceDescriptor::parse(descriptor)?;
        self.extract_from(&source).await
    }

    pub async fn extract_from(&self, source: &SourceDescriptor) -> Result<Dataset, PipelineError> {
        info!(kind = source.kind(), source = %source, "Extracting");
        match source {
            SourceDescriptor::HttpEndpoint { url } => {
                http::fetch_json(&self.client, url, self.api_key.as_deref()).await
            }
            SourceDescriptor::LocalCsv { path } => read_csv(path),
            SourceDescriptor::SqlQuery { text } => match &self.warehouse {
                Some(warehouse) => warehouse.query_dataset(text).await,
                None => Err(PipelineError::Query(
                    "no warehouse configured for sql:// sources".into(),
                )),
            },
        }
    }
}
