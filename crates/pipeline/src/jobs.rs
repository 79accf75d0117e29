//! Job lists: built-in defaults and TOML/YAML job files.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use sluice_core::JobConfig;

#[derive(Debug, Error)]
pub enum JobFileError {
    #[error("cannot read job file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported job file extension: {0} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("invalid job file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("duplicate job name: {0}")]
    DuplicateName(String),
}

#[derive(Debug, Deserialize)]
struct JobFile {
    #[serde(default)]
    jobs: Vec<JobConfig>,
}

/// The three jobs of the stock deployment.
pub fn default_jobs() -> Vec<JobConfig> {
    vec![
        JobConfig::new("user_data_pipeline", "https://api.example.com/users", "table://users"),
        JobConfig::new(
            "sales_data_pipeline",
            "/data/sales.csv",
            "s3://analytics/sales/processed.parquet",
        ),
        JobConfig::new(
            "analytics_pipeline",
            "sql://SELECT * FROM transactions WHERE date >= CURRENT_DATE - 7",
            "/exports/weekly_analytics.csv",
        ),
    ]
}

/// Read a job list, choosing the format from the file extension.
pub fn load_jobs(path: &Path) -> Result<Vec<JobConfig>, JobFileError> {
    let shown = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let contents = std::fs::read_to_string(path).map_err(|source| JobFileError::Read {
        path: shown.clone(),
        source,
    })?;

    let parse_err = |message: String| JobFileError::Parse {
        path: shown.clone(),
        message,
    };
    let file: JobFile = match ext.as_str() {
        "toml" => toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?,
        _ => return Err(JobFileError::UnsupportedFormat(shown)),
    };

    check_unique(&file.jobs)?;
    info!(path = %shown, jobs = file.jobs.len(), "Loaded job file");
    Ok(file.jobs)
}

fn check_unique(jobs: &[JobConfig]) -> Result<(), JobFileError> {
    let mut seen = HashSet::new();
    for job in jobs {
        if !seen.insert(job.name.as_str()) {
            return Err(JobFileError::DuplicateName(job.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{DestinationDescriptor, SourceDescriptor};

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn default_jobs_classify() {
        let jobs = default_jobs();
        assert_eq!(jobs.len(), 3);
        assert!(matches!(
            jobs[0].source_descriptor().unwrap(),
            SourceDescriptor::HttpEndpoint { .. }
        ));
        assert!(matches!(
            jobs[1].destination_descriptor().unwrap(),
            DestinationDescriptor::ObjectStore { ref bucket, ref key }
                if bucket == "analytics" && key == "sales/processed.parquet"
        ));
        assert!(matches!(
            jobs[2].source_descriptor().unwrap(),
            SourceDescriptor::SqlQuery { .. }
        ));
        assert!(check_unique(&jobs).is_ok());
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "jobs.toml",
            r#"
[[jobs]]
name = "orders"
source = "/data/orders.csv"
destination = "table://orders"

[[jobs]]
name = "users"
source = "https://api.example.com/users"
destination = "/exports/users.csv"
"#,
        );
        let jobs = load_jobs(&path).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0], JobConfig::new("orders", "/data/orders.csv", "table://orders"));
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "jobs.yml",
            "jobs:\n  - name: weekly\n    source: \"sql://SELECT 1\"\n    destination: /tmp/weekly.csv\n",
        );
        let jobs = load_jobs(&path).unwrap();
        assert_eq!(jobs, vec![JobConfig::new("weekly", "sql://SELECT 1", "/tmp/weekly.csv")]);
    }

    #[test]
    fn rejects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "jobs.yaml",
            "jobs:\n  - {name: a, source: x.csv, destination: y.csv}\n  - {name: a, source: z.csv, destination: w.csv}\n",
        );
        assert!(matches!(load_jobs(&path), Err(JobFileError::DuplicateName(ref n)) if n == "a"));
    }

    #[test]
    fn rejects_unknown_extension_and_bad_content() {
        let dir = tempfile::tempdir().unwrap();
        let json = write(&dir, "jobs.json", "{}");
        assert!(matches!(load_jobs(&json), Err(JobFileError::UnsupportedFormat(_))));

        let broken = write(&dir, "jobs.toml", "[[jobs]]\nname = 3\n");
        assert!(matches!(load_jobs(&broken), Err(JobFileError::Parse { .. })));

        let missing = dir.path().join("nope.toml");
        assert!(matches!(load_jobs(&missing), Err(JobFileError::Read { .. })));
    }
}
