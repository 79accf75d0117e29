use thiserror::Error;

/// Failure taxonomy shared by every pipeline stage.
///
/// Stages map their library errors into one of these variants at the call
/// site and return immediately; only the batch driver inspects them.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("unsupported destination: {0}")]
    UnsupportedDestination(String),

    #[error("remote error from {url}{}: {message}", status_suffix(.status))]
    Remote {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("IO error at {path}: {message}")]
    Io { path: String, message: String },

    #[error("query error: {0}")]
    Query(String),

    #[error("object storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("object storage error: {0}")]
    Storage(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl PipelineError {
    pub fn io(path: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        PipelineError::Io {
            path: path.to_string(),
            message: err.to_string(),
        }
    }

    pub fn query(err: impl std::fmt::Display) -> Self {
        PipelineError::Query(err.to_string())
    }

    /// Short machine-friendly name of the variant, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedSource(_) => "unsupported_source",
            PipelineError::UnsupportedDestination(_) => "unsupported_destination",
            PipelineError::Remote { .. } => "remote",
            PipelineError::Io { .. } => "io",
            PipelineError::Query(_) => "query",
            PipelineError::StorageUnavailable(_) => "storage_unavailable",
            PipelineError::Storage(_) => "storage",
        }
    }
}
