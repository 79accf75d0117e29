use std::collections::HashMap;
use std::sync::Arc;

use object_store::aws::AmazonS3Builder;
use object_store::ObjectStore;
use tracing::{debug, info};

use sluice_core::config::AwsConfig;
use sluice_core::PipelineError;

/// Object stores keyed by bucket name.
///
/// Buckets registered with [`ObjectStores::with_store`] resolve to that store;
/// any other bucket gets an S3 client built from the AWS credentials.
#[derive(Clone)]
pub struct ObjectStores {
    aws: AwsConfig,
    overrides: HashMap<String, Arc<dyn ObjectStore>>,
}

impl ObjectStores {
    pub fn new(aws: &AwsConfig) -> Self {
        Self {
            aws: aws.clone(),
            overrides: HashMap::new(),
        }
    }

    /// Serve `bucket` from `store` instead of S3.
    pub fn with_store(mut self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.overrides.insert(bucket.into(), store);
        self
    }

    pub fn resolve(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, PipelineError> {
        if let Some(store) = self.overrides.get(bucket) {
            debug!(bucket, "Using registered object store");
            return Ok(store.clone());
        }
        if !self.aws.is_configured() {
            return Err(PipelineError::StorageUnavailable(format!(
                "no credentials configured for bucket '{bucket}'"
            )));
        }
        s3_store(&self.aws, bucket)
    }
}

impl std::fmt::Debug for ObjectStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buckets: Vec<&String> = self.overrides.keys().collect();
        buckets.sort();
        f.debug_struct("ObjectStores")
            .field("region", &self.aws.region)
            .field("credentials", &self.aws.is_configured())
            .field("overrides", &buckets)
            .finish()
    }
}

fn s3_store(aws: &AwsConfig, bucket: &str) -> Result<Arc<dyn ObjectStore>, PipelineError> {
    let mut builder = AmazonS3Builder::new().with_region(&aws.region);

    if let Some(ref key) = aws.access_key_id {
        builder = builder.with_access_key_id(key);
    }
    if let Some(ref secret) = aws.secret_access_key {
        builder = builder.with_secret_access_key(secret);
    }
    if let Some(ref token) = aws.session_token {
        builder = builder.with_token(token);
    }

    match aws.endpoint_url.as_deref().filter(|e| !e.is_empty()) {
        Some(endpoint) => {
            // object_store requires an absolute endpoint URL
            let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                endpoint.to_string()
            } else {
                format!("https://{endpoint}")
            };
            builder = builder
                .with_bucket_name(bucket)
                .with_endpoint(&endpoint_url)
                .with_allow_http(endpoint_url.starts_with("http://"));
        }
        None => {
            builder = builder.with_url(format!("s3://{bucket}"));
        }
    }

    let store = builder
        .build()
        .map_err(|e| PipelineError::StorageUnavailable(format!("bucket '{bucket}': {e}")))?;
    info!("Storage: S3 bucket s3://{} (region: {})", bucket, aws.region);
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn aws(configured: bool) -> AwsConfig {
        AwsConfig {
            region: "us-east-1".into(),
            access_key_id: configured.then(|| "AKIDEXAMPLE".to_string()),
            secret_access_key: configured.then(|| "secret".to_string()),
            session_token: None,
            s3_bucket: "data-pipeline-bucket".into(),
            endpoint_url: None,
        }
    }

    #[test]
    fn unconfigured_bucket_is_unavailable() {
        let err = ObjectStores::new(&aws(false)).resolve("analytics").unwrap_err();
        assert!(matches!(err, PipelineError::StorageUnavailable(_)), "{err:?}");
    }

    #[test]
    fn registered_store_wins_without_credentials() {
        let stores = ObjectStores::new(&aws(false)).with_store("analytics", Arc::new(InMemory::new()));
        assert!(stores.resolve("analytics").is_ok());
        assert!(stores.resolve("other").is_err());
    }

    #[test]
    fn credentials_build_s3_client() {
        assert!(ObjectStores::new(&aws(true)).resolve("analytics").is_ok());

        let mut custom = aws(true);
        custom.endpoint_url = Some("localhost:9000".into());
        assert!(ObjectStores::new(&custom).resolve("analytics").is_ok());
    }
}
