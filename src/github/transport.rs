//! GraphQL transport for the GitHub API
//!
//! The transport is the narrowest possible capability: execute one query
//! with variables and hand back raw JSON or a typed error. Everything above
//! it (pagination, extraction, aggregation) works against the trait, so the
//! pipeline runs unchanged against the in-memory mock in tests.
//!
//! # Example
//!
//! ```no_run
//! use stackscan::github::{GithubTransport, GraphqlClient, REPOSITORIES_QUERY};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GraphqlClient::new("ghs_installation_token".to_string());
//!
//! let page = client
//!     .execute(
//!         REPOSITORIES_QUERY,
//!         json!({ "org": "acme", "limit": 30, "cursor": null }),
//!     )
//!     .await?;
//! println!("{}", page);
//! # Ok(())
//! # }
//! ```

use crate::github::error::ApiError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Default GraphQL endpoint
const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Default request timeout for API calls
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Executes GraphQL queries against the upstream API.
///
/// Implementations must be cheap to share behind an `Arc` and safe to call
/// from the single pipeline task.
#[async_trait]
pub trait GithubTransport: Send + Sync {
    /// Executes one query and returns the raw response JSON.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, ApiError>;

    fn name(&self) -> &str;

    fn endpoint_info(&self) -> Option<String> {
        None
    }
}

/// Production transport backed by `reqwest`.
///
/// Maps HTTP-level outcomes into the [`ApiError`] taxonomy:
/// 401/403 become `AuthRejected`, 429 becomes `RateLimited` (carrying the
/// `Retry-After` header when present), 5xx becomes `Upstream`, and
/// GraphQL-level `errors` in a 200 response become `QueryFailed`.
pub struct GraphqlClient {
    endpoint: String,
    token: String,
    http_client: Client,
    timeout: Duration,
}

impl GraphqlClient {
    /// Creates a client for the public GitHub endpoint with default timeout.
    pub fn new(token: String) -> Self {
        Self::with_timeout(token, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client for the public GitHub endpoint with a custom timeout.
    pub fn with_timeout(token: String, timeout: Duration) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string(), token, timeout)
    }

    /// Creates a client with an explicit endpoint and timeout.
    ///
    /// The endpoint override exists for GitHub Enterprise installations and
    /// for pointing tests at a stub server.
    pub fn with_endpoint(endpoint: String, token: String, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stackscan/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            endpoint,
            token,
            http_client,
            timeout,
        }
    }
}

#[async_trait]
impl GithubTransport for GraphqlClient {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, ApiError> {
        let body = serde_json::json!({
            "query": query,
            "variables": variables,
        });

        debug!("Sending GraphQL request to {}", self.endpoint);
        let start = Instant::now();

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("GraphQL request timed out after {:?}", self.timeout);
                    ApiError::Timeout {
                        seconds: self.timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    error!("Cannot connect to {}", self.endpoint);
                    ApiError::Network {
                        message: format!("Connection failed: {}", e),
                    }
                } else {
                    error!("GraphQL request error: {}", e);
                    ApiError::Network {
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();

        if status.as_u16() == 401 || status.as_u16() == 403 {
            let message = response.text().await.unwrap_or_default();
            warn!("Authorization rejected with status {}", status);
            return Err(ApiError::AuthRejected {
                status: status.as_u16(),
                message: truncate(&message, 200),
            });
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            warn!(?retry_after, "Rate limited by upstream");
            return Err(ApiError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Upstream returned status {}: {}", status, message);
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                message: truncate(&message, 200),
            });
        }

        let payload: Value = response.json().await.map_err(|e| {
            error!("Failed to parse GraphQL response: {}", e);
            ApiError::InvalidResponse {
                message: format!("JSON parse error: {}", e),
            }
        })?;

        // GraphQL reports query-level failures in-band with status 200.
        if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let message = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                error!("GraphQL query returned errors: {}", message);
                return Err(ApiError::QueryFailed { message });
            }
        }

        info!(
            "GraphQL request completed in {:.2}s",
            start.elapsed().as_secs_f64()
        );

        Ok(payload)
    }

    fn name(&self) -> &str {
        "github-graphql"
    }

    fn endpoint_info(&self) -> Option<String> {
        Some(self.endpoint.clone())
    }
}

impl fmt::Debug for GraphqlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Token intentionally omitted.
        f.debug_struct("GraphqlClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
