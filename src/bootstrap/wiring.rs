//! # Dependency Injection / 依赖注入模块
//!
//! The only place that depends on `mr-app` and `mr-infra` together. It
//! assembles adapters behind their ports and hands the store to the host;
//! it makes no session decisions of its own.

use std::path::PathBuf;
use std::sync::Arc;

use mr_app::RegistrationSessionStore;
use mr_core::config::AppConfig;
use mr_core::SessionEvent;
use mr_infra::{BroadcastSessionEventPublisher, FileSessionBlobStore, SystemClock, TokioTimer};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::info;

/// Assembled session core, owned by the host for the process lifetime.
pub struct RegistrationRuntime {
    pub store: Arc<RegistrationSessionStore>,
    events: Arc<BroadcastSessionEventPublisher>,
    storage_dir: PathBuf,
}

impl RegistrationRuntime {
    /// Receive `TimedOut` / `Expired` notifications for UI redirects.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn storage_dir(&self) -> &std::path::Path {
        &self.storage_dir
    }
}

/// Build the session store from configuration.
///
/// Idle timers run on `runtime`. The snapshot lives in `[storage] dir`, or
/// under the platform data directory when unset. Any persisted session is
/// restored before this returns.
pub fn wire_registration(
    config: &AppConfig,
    runtime: Handle,
) -> anyhow::Result<RegistrationRuntime> {
    let blobs = match &config.storage.dir {
        Some(dir) => FileSessionBlobStore::new(dir.clone()),
        None => FileSessionBlobStore::with_defaults()?,
    };
    let storage_dir = blobs.base_dir().to_path_buf();
    let events = Arc::new(BroadcastSessionEventPublisher::new());
    let policy = config.policy();

    let store = RegistrationSessionStore::new(
        Arc::new(blobs),
        Arc::new(SystemClock),
        Arc::new(TokioTimer::new(runtime)),
        events.clone(),
        policy,
    );

    info!(
        storage_dir = %storage_dir.display(),
        session_ttl_secs = policy.session_ttl_secs,
        idle_timeout_secs = policy.idle_timeout_secs,
        restored = store.current_session().is_some(),
        "registration session core wired"
    );

    Ok(RegistrationRuntime {
        store: Arc::new(store),
        events,
        storage_dir,
    })
}
