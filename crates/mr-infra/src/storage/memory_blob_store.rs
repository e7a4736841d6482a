use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use mr_core::ports::SessionBlobStorePort;

/// Process-local blob store.
///
/// Used where no durable storage is wanted (tests, ephemeral hosts).
#[derive(Default)]
pub struct InMemorySessionBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl InMemorySessionBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl SessionBlobStorePort for InMemorySessionBlobStore {
    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
