//! Configuration management for stackscan
//!
//! This module loads run configuration from environment variables, the same
//! variables the scheduled batch job is provisioned with. CLI flags may
//! override individual values after loading.
//!
//! # Environment Variables
//!
//! - `GITHUB_ORG`: organization slug to inventory - **required**
//! - `GITHUB_APP_CLIENT_ID`: client id paired with the stored credential
//! - `AWS_SECRET_NAME`: Secrets Manager secret holding the credential payload
//! - `SOURCE_BUCKET` / `SOURCE_KEY`: S3 destination, required in production
//! - `ENVIRONMENT`: "production" selects S3, anything else a local file
//! - `BATCH_SIZE`: repositories requested per page - default: "30"
//! - `MAX_RETRIES`: attempts per page before giving up - default: "5"
//! - `SCAN_OUTPUT_PATH`: local destination - default: "repositories.json"
//! - `SCAN_REQUEST_TIMEOUT`: per-request timeout in seconds - default: "30"
//! - `SCAN_DEADLINE_SECS`: optional whole-run deadline in seconds
//! - `SCAN_LOG_LEVEL`: log level when `RUST_LOG` is unset - default: "info"

use crate::github::MAX_PAGE_SIZE;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default values for configuration
const DEFAULT_BATCH_SIZE: u32 = 30;
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_OUTPUT_PATH: &str = "repositories.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing
    #[error("Missing required environment variable: {name}")]
    MissingVariable { name: &'static str },

    /// Failed to parse a configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Destination selector for the inventory artifact
///
/// Resolved once at configuration time; the pipeline never consults the
/// environment again after this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Write the artifact to the configured S3 bucket/key
    Production,
    /// Write the artifact to a local file
    Development,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Production => write!(f, "production"),
            RunMode::Development => write!(f, "development"),
        }
    }
}

/// Main configuration structure for a scan run
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Organization slug whose repositories are inventoried
    pub organization: String,

    /// Application client identifier paired with the stored secret
    pub client_id: String,

    /// Secrets Manager secret id holding the credential payload
    pub secret_name: String,

    /// Repositories requested per page
    pub batch_size: u32,

    /// Attempts per page before the run is aborted
    pub max_retries: u32,

    /// Artifact destination selector
    pub run_mode: RunMode,

    /// S3 bucket, required when `run_mode` is production
    pub bucket: Option<String>,

    /// S3 object key, required when `run_mode` is production
    pub key: Option<String>,

    /// Local destination path used outside production
    pub output_path: PathBuf,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Optional whole-run deadline in seconds
    pub deadline_secs: Option<u64>,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl ScanConfig {
    /// Loads configuration from environment variables
    ///
    /// `GITHUB_ORG` is required; everything else falls back to a default.
    /// Values that are present but unparseable are an error, not a silent
    /// fallback - a typo in `BATCH_SIZE` should fail the run at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let organization =
            env::var("GITHUB_ORG").map_err(|_| ConfigError::MissingVariable { name: "GITHUB_ORG" })?;

        let client_id = env::var("GITHUB_APP_CLIENT_ID").unwrap_or_default();
        let secret_name = env::var("AWS_SECRET_NAME").unwrap_or_default();

        let batch_size = parse_var("BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let max_retries = parse_var("MAX_RETRIES", DEFAULT_MAX_RETRIES)?;
        let request_timeout_secs = parse_var("SCAN_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        let deadline_secs = match env::var("SCAN_DEADLINE_SECS") {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|e| ConfigError::ParseError {
                field: "SCAN_DEADLINE_SECS".to_string(),
                error: e.to_string(),
            })?),
            Err(_) => None,
        };

        let run_mode = match env::var("ENVIRONMENT") {
            Ok(v) if v.eq_ignore_ascii_case("production") => RunMode::Production,
            _ => RunMode::Development,
        };

        let bucket = env::var("SOURCE_BUCKET").ok();
        let key = env::var("SOURCE_KEY").ok();

        let output_path = env::var("SCAN_OUTPUT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_PATH));

        let log_level = env::var("SCAN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Ok(Self {
            organization,
            client_id,
            secret_name,
            batch_size,
            max_retries,
            run_mode,
            bucket,
            key,
            output_path,
            request_timeout_secs,
            deadline_secs,
            log_level,
        })
    }

    /// Validates the configuration
    ///
    /// Checks that:
    /// - The batch size is positive and within the upstream page limit
    /// - The retry count and timeout are in sane ranges
    /// - A production run has a bucket and key to write to
    /// - The log level is valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.organization.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Organization must not be empty".to_string(),
            ));
        }

        if self.batch_size == 0 || self.batch_size > MAX_PAGE_SIZE {
            return Err(ConfigError::ValidationFailed(format!(
                "Batch size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.batch_size
            )));
        }

        if self.max_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max retries must be at least 1".to_string(),
            ));
        }
        if self.max_retries > 10 {
            return Err(ConfigError::ValidationFailed(
                "Max retries cannot exceed 10".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.run_mode == RunMode::Production {
            if self.bucket.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "SOURCE_BUCKET is required in production".to_string(),
                ));
            }
            if self.key.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "SOURCE_KEY is required in production".to_string(),
                ));
            }
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Human-readable description of the artifact destination
    pub fn destination(&self) -> String {
        match self.run_mode {
            RunMode::Production => format!(
                "s3://{}/{}",
                self.bucket.as_deref().unwrap_or("?"),
                self.key.as_deref().unwrap_or("?")
            ),
            RunMode::Development => self.output_path.display().to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().map_err(|e| ConfigError::ParseError {
            field: name.to_string(),
            error: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl fmt::Display for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scan Configuration:")?;
        writeln!(f, "  Organization: {}", self.organization)?;
        writeln!(f, "  Batch Size: {}", self.batch_size)?;
        writeln!(f, "  Max Retries: {}", self.max_retries)?;
        writeln!(f, "  Run Mode: {}", self.run_mode)?;
        writeln!(f, "  Destination: {}", self.destination())?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        if let Some(deadline) = self.deadline_secs {
            writeln!(f, "  Deadline: {}s", deadline)?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
