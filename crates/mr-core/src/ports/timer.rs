use std::time::Duration;

/// Work run once when a timer elapses.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// One-shot timers addressed by key.
///
/// Starting a timer under a key that is already armed cancels the previous
/// one, so at most one timer per key is ever in flight.
pub trait TimerPort: Send + Sync {
    fn start(&self, key: &str, delay: Duration, task: TimerTask) -> anyhow::Result<()>;
    fn stop(&self, key: &str) -> anyhow::Result<()>;
}
