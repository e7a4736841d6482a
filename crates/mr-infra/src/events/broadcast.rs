use mr_core::ports::SessionEventPort;
use mr_core::SessionEvent;
use tokio::sync::broadcast;
use tracing::{debug, info};

const DEFAULT_CAPACITY: usize = 16;

/// Fans session lifecycle events out to every UI subscriber.
///
/// Emitting with no subscriber is not an error; the event is dropped.
pub struct BroadcastSessionEventPublisher {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastSessionEventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastSessionEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEventPort for BroadcastSessionEventPublisher {
    fn emit(&self, event: SessionEvent) {
        match self.sender.send(event) {
            Ok(receivers) => info!(?event, receivers, "session event broadcast"),
            Err(_) => debug!(?event, "session event dropped: no subscribers"),
        }
    }
}
