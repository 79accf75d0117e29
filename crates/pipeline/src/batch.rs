use std::time::Instant;

use tracing::{error, info};

use sluice_core::{JobConfig, PipelineError};

use crate::runner::{PipelineContext, PipelineRunner, RunSummary};

/// Result of one job within a batch.
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: Result<RunSummary, PipelineError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }
}

/// Runs jobs in order; a failing job never stops the ones after it.
pub struct BatchDriver<'a> {
    runner: PipelineRunner<'a>,
}

impl<'a> BatchDriver<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self {
            runner: PipelineRunner::new(ctx),
        }
    }

    pub async fn run_all(&self, jobs: &[JobConfig]) -> BatchReport {
        let start = Instant::now();
        let mut report = BatchReport::default();

        for job in jobs {
            let result = self.runner.run(job).await;
            if let Err(ref e) = result {
                error!(job = %job.name, kind = e.kind(), "Pipeline {} failed: {}", job.name, e);
            }
            report.outcomes.push(JobOutcome {
                name: job.name.clone(),
                result,
            });
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch complete in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        report
    }
}
