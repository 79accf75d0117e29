//! Typed source/destination descriptors parsed from job strings.
//!
//! Scheme prefixes are checked before the `.csv` suffix so a descriptor never
//! matches two variants.

use std::fmt;
use std::path::PathBuf;

use crate::error::PipelineError;

const HTTP_SCHEMES: &[&str] = &["http://", "https://"];
const SQL_SCHEME: &str = "sql://";
const S3_SCHEME: &str = "s3://";
const TABLE_SCHEME: &str = "table://";

fn has_csv_suffix(s: &str) -> bool {
    s.len() > 4
        && s.is_char_boundary(s.len() - 4)
        && s[s.len() - 4..].eq_ignore_ascii_case(".csv")
}

/// Where a job reads its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    HttpEndpoint { url: String },
    LocalCsv { path: PathBuf },
    SqlQuery { text: String },
}

impl SourceDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, PipelineError> {
        if HTTP_SCHEMES.iter().any(|s| descriptor.starts_with(s)) {
            return Ok(SourceDescriptor::HttpEndpoint {
                url: descriptor.to_string(),
            });
        }
        if let Some(query) = descriptor.strip_prefix(SQL_SCHEME) {
            let text = query.trim();
            if text.is_empty() {
                return Err(PipelineError::UnsupportedSource(descriptor.to_string()));
            }
            return Ok(SourceDescriptor::SqlQuery {
                text: text.to_string(),
            });
        }
        if has_csv_suffix(descriptor) {
            return Ok(SourceDescriptor::LocalCsv {
                path: PathBuf::from(descriptor),
            });
        }
        Err(PipelineError::UnsupportedSource(descriptor.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceDescriptor::HttpEndpoint { .. } => "http",
            SourceDescriptor::LocalCsv { .. } => "csv",
            SourceDescriptor::SqlQuery { .. } => "sql",
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::HttpEndpoint { url } => f.write_str(url),
            SourceDescriptor::LocalCsv { path } => write!(f, "{}", path.display()),
            SourceDescriptor::SqlQuery { text } => write!(f, "{SQL_SCHEME}{text}"),
        }
    }
}

/// Where a job writes its data to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationDescriptor {
    ObjectStore { bucket: String, key: String },
    LocalFile { path: PathBuf },
    Table { name: String },
}

impl DestinationDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, PipelineError> {
        let unsupported = || PipelineError::UnsupportedDestination(descriptor.to_string());

        if let Some(rest) = descriptor.strip_prefix(S3_SCHEME) {
            let (bucket, key) = rest.split_once('/').ok_or_else(unsupported)?;
            if bucket.is_empty() || key.is_empty() {
                return Err(unsupported());
            }
            return Ok(DestinationDescriptor::ObjectStore {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if let Some(name) = descriptor.strip_prefix(TABLE_SCHEME) {
            let name = name.trim();
            if name.is_empty() {
                return Err(unsupported());
            }
            return Ok(DestinationDescriptor::Table {
                name: name.to_string(),
            });
        }
        if has_csv_suffix(descriptor) {
            return Ok(DestinationDescriptor::LocalFile {
                path: PathBuf::from(descriptor),
            });
        }
        Err(unsupported())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DestinationDescriptor::ObjectStore { .. } => "s3",
            DestinationDescriptor::LocalFile { .. } => "csv",
            DestinationDescriptor::Table { .. } => "table",
        }
    }
}

impl fmt::Display for DestinationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationDescriptor::ObjectStore { bucket, key } => write!(f, "{S3_SCHEME}{bucket}/{key}"),
            DestinationDescriptor::LocalFile { path } => write!(f, "{}", path.display()),
            DestinationDescriptor::Table { name } => write!(f, "{TABLE_SCHEME}{name}"),
        }
    }
}
