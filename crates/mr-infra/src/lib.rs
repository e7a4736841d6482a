pub mod events;
pub mod storage;
pub mod time;

pub use events::BroadcastSessionEventPublisher;
pub use storage::{FileSessionBlobStore, InMemorySessionBlobStore};
pub use time::{SystemClock, TokioTimer};
