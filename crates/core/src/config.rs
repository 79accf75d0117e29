use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://sluice.db";

/// Keys whose absence is reported at startup. Defaults still apply.
const REQUIRED_KEYS: &[&str] = &["DATABASE_URL", "API_KEY"];

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub aws: AwsConfig,
    pub staging: StagingConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `SLUICE_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("SLUICE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            database: DatabaseConfig::from_env_profiled(p),
            http: HttpConfig::from_env_profiled(p),
            aws: AwsConfig::from_env_profiled(p),
            staging: StagingConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Required keys that were not set for the active profile.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| profiled_env_opt(&self.profile, key).is_none())
            .collect()
    }

    /// Log one warning per missing required key. Never fails.
    pub fn warn_missing(&self) {
        for key in self.missing_required() {
            tracing::warn!("Missing required secret: {}", key);
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  database:    {}", self.database.redacted_url());
        tracing::info!(
            "  http:        api_key={}, timeout={}s",
            if self.http.api_key.is_some() { "set" } else { "(none)" },
            self.http.timeout_secs
        );
        tracing::info!(
            "  aws:         region={}, bucket={}, credentials={}",
            self.aws.region,
            self.aws.s3_bucket,
            self.aws.is_configured()
        );
        tracing::info!("  staging:     dir={}", self.staging.dir.display());
    }

    /// Return a redacted view safe for printing (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "database": {
                "url": self.database.redacted_url(),
                "max_connections": self.database.max_connections,
            },
            "http": {
                "api_key_configured": self.http.api_key.is_some(),
                "timeout_secs": self.http.timeout_secs,
            },
            "aws": {
                "region": self.aws.region,
                "s3_bucket": self.aws.s3_bucket,
                "endpoint_url": self.aws.endpoint_url,
                "configured": self.aws.is_configured(),
            },
            "staging": { "dir": self.staging.dir },
        })
    }
}

// ── Database ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "DATABASE_URL", DEFAULT_DATABASE_URL),
            max_connections: profiled_env_u32(p, "DATABASE_MAX_CONNECTIONS", 5),
        }
    }

    /// URL with any password replaced by `***`.
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        match rest.split_once('@') {
            Some((userinfo, host)) => {
                let user = userinfo.split(':').next().unwrap_or("");
                format!("{scheme}://{user}:***@{host}")
            }
            None => self.url.clone(),
        }
    }
}

// ── HTTP sources ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Bearer token sent to HTTP sources.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl HttpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_key: profiled_env_opt(p, "API_KEY"),
            timeout_secs: profiled_env_u64(p, "HTTP_TIMEOUT_SECS", 60),
        }
    }
}

// ── AWS / S3 ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub s3_bucket: String,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            s3_bucket: profiled_env_or(p, "S3_BUCKET", "data-pipeline-bucket"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }

    /// Both halves of the credential pair are present.
    pub fn is_configured(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

// ── Staging ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directory for temporary files written before upload.
    pub dir: PathBuf,
}

impl StagingConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            dir: profiled_env_opt(p, "SLUICE_STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        }
    }
}
