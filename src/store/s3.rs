use super::{ArtifactStore, StoreError};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;

/// Writes the artifact to an S3 object, used in production.
///
/// Concurrent runs targeting the same key race at the object-storage layer
/// with last-writer-wins semantics, which is fine: every run writes a
/// complete snapshot.
pub struct S3Store {
    client: Client,
    bucket: String,
    key: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Builds a store from the ambient AWS environment.
    pub async fn from_env(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&shared), bucket, key)
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    async fn put(&self, body: Vec<u8>) -> Result<(), StoreError> {
        info!("Writing inventory to {}", self.describe());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::Write {
                destination: self.describe(),
                message: e.into_service_error().to_string(),
            })?;

        Ok(())
    }

    fn describe(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .finish()
    }
}
