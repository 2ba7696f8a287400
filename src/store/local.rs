use super::{ArtifactStore, StoreError};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Writes the artifact to a local file, used outside production.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn put(&self, body: Vec<u8>) -> Result<(), StoreError> {
        info!("Writing inventory to {}", self.path.display());

        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| StoreError::Write {
                destination: self.describe(),
                message: e.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn writes_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repositories.json");
        let store = LocalStore::new(&path);

        store.put(b"{\"first\": true}".to_vec()).await.unwrap();
        store.put(b"{\"second\": true}".to_vec()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"second\": true}");
    }

    #[tokio::test]
    async fn missing_directory_is_a_write_error() {
        let store = LocalStore::new("/nonexistent-dir/out.json");
        let err = store.put(b"{}".to_vec()).await.unwrap_err();
        let StoreError::Write { destination, .. } = err;
        assert!(destination.contains("out.json"));
    }
}
