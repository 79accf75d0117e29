use serde::{Deserialize, Serialize};

use crate::descriptor::{DestinationDescriptor, SourceDescriptor};
use crate::error::PipelineError;

/// One named source -> destination task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub source: String,
    pub destination: String,
}

impl JobConfig {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn source_descriptor(&self) -> Result<SourceDescriptor, PipelineError> {
        SourceDescriptor::parse(&self.source)
    }

    pub fn destination_descriptor(&self) -> Result<DestinationDescriptor, PipelineError> {
        DestinationDescriptor::parse(&self.destination)
    }
}
