mod cli;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sluice_core::config::load_dotenv;
use sluice_core::{Config, JobConfig};
use sluice_pipeline::{default_jobs, load_jobs, BatchDriver, PipelineContext};

use crate::cli::{CliArgs, Command, JobsArgs, LogFormat, RunArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_dotenv();
    let args = CliArgs::parse();
    init_tracing(args.log_format);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(args: CliArgs) -> Result<ExitCode> {
    let profile = args.profile.unwrap_or_default().to_uppercase();
    let config = Config::for_profile(&profile);
    config.warn_missing();

    match args.command {
        Command::Run(run_args) => run_jobs(&config, run_args).await,
        Command::Check(jobs_args) => check_jobs(&jobs_args),
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted_summary())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_jobs(args: &JobsArgs) -> Result<Vec<JobConfig>> {
    match &args.jobs {
        Some(path) => load_jobs(path).with_context(|| format!("failed to load jobs from {}", path.display())),
        None => Ok(default_jobs()),
    }
}

/// Keep the jobs named in `only`, in file order. Empty `only` keeps all.
fn select_jobs(jobs: Vec<JobConfig>, only: &[String]) -> Result<Vec<JobConfig>> {
    if only.is_empty() {
        return Ok(jobs);
    }
    if let Some(unknown) = only.iter().find(|name| !jobs.iter().any(|j| &j.name == *name)) {
        bail!("no job named '{unknown}'");
    }
    Ok(jobs.into_iter().filter(|j| only.contains(&j.name)).collect())
}

async fn run_jobs(config: &Config, args: RunArgs) -> Result<ExitCode> {
    let jobs = select_jobs(read_jobs(&args.jobs)?, &args.only)?;
    config.log_summary();
    info!("Running {} job(s)", jobs.len());

    let ctx = PipelineContext::from_config(config);
    let report = BatchDriver::new(&ctx).run_all(&jobs).await;
    ctx.close().await;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(summary) => println!(
                "ok     {:<28} {:>8} rows -> {} ({:.2}s)",
                outcome.name,
                summary.rows_loaded,
                summary.receipt.destination,
                summary.elapsed.as_secs_f64()
            ),
            Err(e) => println!("FAILED {:<28} [{}] {}", outcome.name, e.kind(), e),
        }
    }
    println!("{} succeeded, {} failed", report.succeeded(), report.failed());

    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn check_jobs(args: &JobsArgs) -> Result<ExitCode> {
    let jobs = read_jobs(args)?;
    let bad = report_descriptors(&jobs);
    println!("{} job(s), {} with unsupported descriptors", jobs.len(), bad);
    Ok(if bad == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Print each job's descriptor kinds; returns how many jobs failed to parse.
fn report_descriptors(jobs: &[JobConfig]) -> usize {
    let mut bad = 0;
    for job in jobs {
        match (job.source_descriptor(), job.destination_descriptor()) {
            (Ok(source), Ok(destination)) => {
                println!("ok     {:<28} {} -> {}", job.name, source.kind(), destination.kind())
            }
            (source, destination) => {
                bad += 1;
                for e in [source.err(), destination.err()].into_iter().flatten() {
                    println!("FAILED {:<28} {}", job.name, e);
                }
            }
        }
    }
    bad
}
