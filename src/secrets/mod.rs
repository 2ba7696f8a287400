//! Credential resolution
//!
//! The pipeline needs exactly one thing from the secret store: the payload
//! stored under a named secret, parsed into [`GithubCredentials`]. A missing
//! or malformed secret is a configuration error - there is no retry here.

pub mod aws;

pub use aws::SecretsManagerProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors from credential resolution
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret path does not exist in the store
    #[error("Secret not found: {id}")]
    NotFound { id: String },

    /// The store could not be reached or refused the request
    #[error("Secret store access failed: {message}")]
    Access { message: String },

    /// The payload does not parse into the expected credential shape
    #[error("Credential payload could not be parsed: {message}")]
    InvalidPayload { message: String },
}

/// Narrow lookup capability over the secret store.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Returns the raw string payload stored under `secret_id`.
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError>;

    fn name(&self) -> &str;
}

/// Parsed credential payload.
///
/// The stored secret already contains a ready API token; minting one from
/// an App private key happens upstream of this system.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubCredentials {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Resolves credentials for a run.
///
/// `client_id` identifies which application the token belongs to; it is
/// carried for traceability and logged, not sent upstream.
pub async fn resolve_credentials(
    provider: &dyn SecretProvider,
    client_id: &str,
    secret_name: &str,
) -> Result<GithubCredentials, SecretError> {
    debug!(
        "Resolving credentials | provider: {} | client: {}",
        provider.name(),
        client_id
    );

    let payload = provider.fetch(secret_name).await?;

    let credentials: GithubCredentials =
        serde_json::from_str(&payload).map_err(|e| SecretError::InvalidPayload {
            message: e.to_string(),
        })?;

    if credentials.token.trim().is_empty() {
        return Err(SecretError::InvalidPayload {
            message: "payload contains an empty token".to_string(),
        });
    }

    Ok(credentials)
}

/// In-memory provider for tests and local development.
#[derive(Debug, Default)]
pub struct MemorySecrets {
    entries: HashMap<String, String>,
}

impl MemorySecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(secret_id: impl Into<String>, payload: impl Into<String>) -> Self {
        let mut provider = Self::new();
        provider.insert(secret_id, payload);
        provider
    }

    pub fn insert(&mut self, secret_id: impl Into<String>, payload: impl Into<String>) {
        self.entries.insert(secret_id.into(), payload.into());
    }
}

#[async_trait]
impl SecretProvider for MemorySecrets {
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        self.entries
            .get(secret_id)
            .cloned()
            .ok_or_else(|| SecretError::NotFound {
                id: secret_id.to_string(),
            })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_token_from_payload() {
        let provider = MemorySecrets::with_secret(
            "github/credentials",
            r#"{"token": "ghs_abc123", "expires_at": "2026-02-01T00:00:00Z"}"#,
        );

        let credentials = resolve_credentials(&provider, "Iv1.abc", "github/credentials")
            .await
            .unwrap();

        assert_eq!(credentials.token, "ghs_abc123");
        assert!(credentials.expires_at.is_some());
    }

    #[tokio::test]
    async fn expiry_is_optional() {
        let provider = MemorySecrets::with_secret("s", r#"{"token": "ghs_abc"}"#);
        let credentials = resolve_credentials(&provider, "Iv1.abc", "s").await.unwrap();
        assert!(credentials.expires_at.is_none());
    }

    #[tokio::test]
    async fn missing_secret_is_not_found() {
        let provider = MemorySecrets::new();
        let err = resolve_credentials(&provider, "Iv1.abc", "github/credentials")
            .await
            .unwrap_err();
        assert!(matches!(err, SecretError::NotFound { .. }));
    }

    #[tokio::test]
    async fn malformed_payload_is_invalid() {
        let provider = MemorySecrets::with_secret("s", "not json at all");
        let err = resolve_credentials(&provider, "Iv1.abc", "s").await.unwrap_err();
        assert!(matches!(err, SecretError::InvalidPayload { .. }));
    }

    #[tokio::test]
    async fn empty_token_is_invalid() {
        let provider = MemorySecrets::with_secret("s", r#"{"token": "  "}"#);
        let err = resolve_credentials(&provider, "Iv1.abc", "s").await.unwrap_err();
        assert!(matches!(err, SecretError::InvalidPayload { .. }));
    }
}
