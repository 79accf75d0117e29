use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Batch ETL runner.
///
/// Extracts datasets from HTTP APIs, CSV files or SQL queries, cleans them,
/// and loads them into S3 (Parquet), CSV files or warehouse tables.
#[derive(Parser, Debug)]
#[command(name = "sluice", about = "Batch ETL runner", version)]
pub struct CliArgs {
    /// Config profile; keys are looked up as {PROFILE}_{KEY} first
    #[arg(long, global = true, env = "SLUICE_PROFILE")]
    pub profile: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, env = "SLUICE_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every job in order and print a summary
    Run(RunArgs),

    /// Classify every job's source and destination without running anything
    Check(JobsArgs),

    /// Print the resolved configuration with secrets redacted
    Config,
}

#[derive(Args, Debug, Default)]
pub struct JobsArgs {
    /// Job file (.toml or .yaml); the built-in jobs are used when omitted
    #[arg(long)]
    pub jobs: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub jobs: JobsArgs,

    /// Run only the named job (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    pub only: Vec<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_filters() {
        let args = CliArgs::try_parse_from([
            "sluice", "run", "--jobs", "jobs.toml", "--only", "a", "--only", "b",
        ])
        .unwrap();
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.jobs.jobs, Some(PathBuf::from("jobs.toml")));
                assert_eq!(run.only, vec!["a", "b"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "sluice", "check", "--profile", "prod", "--log-format", "json",
        ])
        .unwrap();
        assert_eq!(args.profile.as_deref(), Some("prod"));
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(matches!(args.command, Command::Check(JobsArgs { jobs: None })));
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(CliArgs::try_parse_from(["sluice", "config", "--log-format", "xml"]).is_err());
    }
}
