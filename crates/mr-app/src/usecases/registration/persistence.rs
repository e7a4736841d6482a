//! Best-effort snapshot persistence for the registration session.
//!
//! Writes never fail the caller: the in-memory session stays authoritative
//! for the rest of the process lifetime even when a snapshot could not be
//! saved.

use std::sync::Arc;

use anyhow::Context;
use mr_core::ports::{SessionBlobStorePort, SESSION_STORAGE_KEY};
use mr_core::RegistrationSession;
use tracing::{debug, warn};

pub(crate) struct SessionSnapshots {
    blobs: Arc<dyn SessionBlobStorePort>,
}

impl SessionSnapshots {
    pub(crate) fn new(blobs: Arc<dyn SessionBlobStorePort>) -> Self {
        Self { blobs }
    }

    /// Serialize and store `session`; failures are logged and swallowed.
    pub(crate) fn save(&self, session: &RegistrationSession) {
        if let Err(err) = self.try_save(session) {
            warn!(
                session_id = %session.id,
                error = %err,
                "failed to persist registration session snapshot"
            );
        }
    }

    /// Load the stored snapshot.
    ///
    /// `Ok(None)` when nothing is stored; `Err` when the blob exists but
    /// cannot be read or decoded.
    pub(crate) fn load(&self) -> anyhow::Result<Option<RegistrationSession>> {
        let Some(blob) = self
            .blobs
            .load(SESSION_STORAGE_KEY)
            .context("Failed to read registration session snapshot")?
        else {
            return Ok(None);
        };

        let session = serde_json::from_str(&blob)
            .context("Failed to parse registration session snapshot")?;
        Ok(Some(session))
    }

    /// Delete the stored snapshot; failures are logged and swallowed.
    pub(crate) fn remove(&self) {
        match self.blobs.remove(SESSION_STORAGE_KEY) {
            Ok(()) => debug!("registration session snapshot removed"),
            Err(err) => warn!(
                error = %err,
                "failed to remove registration session snapshot"
            ),
        }
    }

    fn try_save(&self, session: &RegistrationSession) -> anyhow::Result<()> {
        let blob = serde_json::to_string(session)
            .context("Failed to serialize registration session")?;
        self.blobs.save(SESSION_STORAGE_KEY, &blob)?;
        debug!(session_id = %session.id, bytes = blob.len(), "registration session persisted");
        Ok(())
    }
}
