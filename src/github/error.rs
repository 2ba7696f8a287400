//! GitHub API error taxonomy
//!
//! This module defines ApiError, separating transient upstream conditions
//! (retried by the pager) from fatal ones (surfaced immediately).

use std::fmt;
use std::time::Duration;

/// Errors that can occur while querying the upstream API
#[derive(Debug, Clone)]
pub enum ApiError {
    /// Credentials were rejected (401/403); never retried
    AuthRejected { status: u16, message: String },

    /// Rate limit exceeded; `retry_after` carries the server's reset hint
    RateLimited { retry_after: Option<u64> },

    /// Upstream returned a server-side error status (5xx)
    Upstream { status: u16, message: String },

    /// Network-level failure (connect, DNS, broken transfer)
    Network { message: String },

    /// Request timed out after the specified duration (in seconds)
    Timeout { seconds: u64 },

    /// The response body could not be parsed into the expected shape
    InvalidResponse { message: String },

    /// The GraphQL layer reported query errors in a 200 response
    QueryFailed { message: String },

    /// The requested batch size exceeds the upstream page limit
    InvalidBatchSize { given: u32, max: u32 },

    /// Transient retries were exhausted for one page
    UpstreamUnavailable { attempts: u32, last_error: String },

    /// The run deadline would be crossed by the next retry wait
    DeadlineExceeded,
}

impl ApiError {
    /// Whether the pager should retry this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited { .. }
                | ApiError::Upstream { .. }
                | ApiError::Network { .. }
                | ApiError::Timeout { .. }
        )
    }

    /// Server-provided backoff hint, when the error carries one.
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited {
                retry_after: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::AuthRejected { status, message } => {
                write!(f, "Authorization rejected ({}): {}", status, message)
            }
            ApiError::RateLimited { retry_after } => {
                if let Some(seconds) = retry_after {
                    write!(f, "Rate limit exceeded, retry after {} seconds", seconds)
                } else {
                    write!(f, "Rate limit exceeded")
                }
            }
            ApiError::Upstream { status, message } => {
                write!(f, "Upstream error ({}): {}", status, message)
            }
            ApiError::Network { message } => write!(f, "Network error: {}", message),
            ApiError::Timeout { seconds } => {
                write!(f, "Request timed out after {} seconds", seconds)
            }
            ApiError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            ApiError::QueryFailed { message } => {
                write!(f, "GraphQL query failed: {}", message)
            }
            ApiError::InvalidBatchSize { given, max } => {
                write!(f, "Invalid batch size {}: must be between 1 and {}", given, max)
            }
            ApiError::UpstreamUnavailable {
                attempts,
                last_error,
            } => {
                write!(
                    f,
                    "Upstream unavailable after {} attempts (last error: {})",
                    attempts, last_error
                )
            }
            ApiError::DeadlineExceeded => write!(f, "Run deadline exceeded"),
        }
    }
}

impl std::error::Error for ApiError {}
