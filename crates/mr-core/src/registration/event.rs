use serde::{Deserialize, Serialize};

/// Lifecycle notifications broadcast to the UI layer.
///
/// Neither variant carries a payload: the session is already gone when the
/// event is emitted and the UI only needs to redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEvent {
    /// The idle watchdog fired and the session was torn down.
    TimedOut,
    /// A session past its `expires_at` was purged.
    Expired,
}
