//! Session blob store port
//!
//! Durable client-side key/value storage for the serialized registration
//! session. Implementations are provided by the infrastructure layer
//! (file-backed, in-memory).

/// Key under which the current registration session is stored.
pub const SESSION_STORAGE_KEY: &str = "medreg.registration_session";

pub trait SessionBlobStorePort: Send + Sync {
    /// Store `blob` under `key`, replacing any previous value.
    fn save(&self, key: &str, blob: &str) -> anyhow::Result<()>;

    /// Read the blob under `key`, or `None` when nothing is stored.
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Delete the blob under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}
