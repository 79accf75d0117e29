pub mod config;
pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod job;

pub use config::Config;
pub use dataset::*;
pub use descriptor::{DestinationDescriptor, SourceDescriptor};
pub use error::*;
pub use job::JobConfig;
