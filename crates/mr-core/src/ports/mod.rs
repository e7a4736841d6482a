//! Port interfaces for the application layer
//!
//! Ports define the contract between the session use cases and
//! infrastructure implementations. This follows Hexagonal Architecture
//! principles: the session core depends only on these traits, never on a
//! concrete clock, timer runtime, storage medium or UI channel.

mod clock;
mod session_blob_store;
mod session_event;
mod timer;

pub use clock::ClockPort;
pub use session_blob_store::{SessionBlobStorePort, SESSION_STORAGE_KEY};
pub use session_event::SessionEventPort;
pub use timer::{TimerPort, TimerTask};
