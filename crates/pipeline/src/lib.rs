//! Extract, transform, load: the job runner and the batch driver around it.

pub mod batch;
pub mod jobs;
pub mod runner;
pub mod transform;

pub use batch::{BatchDriver, BatchReport, JobOutcome};
pub use jobs::{default_jobs, load_jobs, JobFileError};
pub use runner::{PipelineContext, PipelineRunner, RunSummary};
pub use transform::{transform, transform_at, Transformer};
