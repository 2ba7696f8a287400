use super::{ArtifactStore, StoreError};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory store for tests.
///
/// Remembers every write so tests can assert both on the final artifact and
/// on how many times it was replaced.
#[derive(Debug, Default)]
pub struct MemoryStore {
    writes: Mutex<Vec<Vec<u8>>>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `put` fail with the given message.
    pub fn fail_writes(&self, message: impl Into<String>) {
        *self.fail_with.lock().unwrap() = Some(message.into());
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// The most recent artifact, if any write happened.
    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    async fn put(&self, body: Vec<u8>) -> Result<(), StoreError> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(StoreError::Write {
                destination: self.describe(),
                message,
            });
        }

        self.writes.lock().unwrap().push(body);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
