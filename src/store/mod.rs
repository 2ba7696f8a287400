//! Artifact persistence
//!
//! The pipeline produces exactly one blob per run and replaces whatever is
//! at the destination - each run is a fresh snapshot, never an append or a
//! merge. The destination is fixed when the store is constructed; nothing
//! downstream consults the environment again.

pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from artifact persistence
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write itself failed (permissions, missing bucket, I/O)
    #[error("Failed to write artifact to {destination}: {message}")]
    Write {
        destination: String,
        message: String,
    },
}

/// Durable persistence of one named blob.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Replaces the artifact at this store's destination with `body`.
    async fn put(&self, body: Vec<u8>) -> Result<(), StoreError>;

    /// Human-readable destination, for logs and error context.
    fn describe(&self) -> String;
}
