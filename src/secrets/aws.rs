//! AWS Secrets Manager provider

use super::{SecretError, SecretProvider};
use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use tracing::info;

/// Production secret provider backed by AWS Secrets Manager.
pub struct SecretsManagerProvider {
    client: Client,
}

impl SecretsManagerProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a provider from the ambient AWS environment (region,
    /// credentials chain).
    pub async fn from_env() -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&shared))
    }
}

#[async_trait]
impl SecretProvider for SecretsManagerProvider {
    async fn fetch(&self, secret_id: &str) -> Result<String, SecretError> {
        info!("Fetching secret from AWS Secrets Manager");

        let output = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_resource_not_found_exception() {
                    SecretError::NotFound {
                        id: secret_id.to_string(),
                    }
                } else {
                    SecretError::Access {
                        message: service_error.to_string(),
                    }
                }
            })?;

        output
            .secret_string()
            .map(str::to_owned)
            .ok_or_else(|| SecretError::InvalidPayload {
                message: "secret has no string payload".to_string(),
            })
    }

    fn name(&self) -> &str {
        "aws-secrets-manager"
    }
}

impl std::fmt::Debug for SecretsManagerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretsManagerProvider").finish()
    }
}
