use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use mr_core::ports::{TimerPort, TimerTask};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::debug;

struct ArmedTimer {
    generation: u64,
    handle: AbortHandle,
}

type TimerMap = Arc<Mutex<HashMap<String, ArmedTimer>>>;

/// [`TimerPort`] backed by tokio tasks.
///
/// Each armed key owns one sleeping task; restarting or stopping a key
/// aborts its task. A task removes its own entry before running the timer
/// work, and only if it is still the current entry for the key.
pub struct TokioTimer {
    runtime: Handle,
    timers: TimerMap,
    next_generation: AtomicU64,
}

impl TokioTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Bind to the runtime of the calling context.
    pub fn current() -> anyhow::Result<Self> {
        let runtime = Handle::try_current().context("TokioTimer requires a tokio runtime")?;
        Ok(Self::new(runtime))
    }

    pub fn is_armed(&self, key: &str) -> bool {
        lock(&self.timers).contains_key(key)
    }
}

fn lock(timers: &TimerMap) -> MutexGuard<'_, HashMap<String, ArmedTimer>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TimerPort for TokioTimer {
    fn start(&self, key: &str, delay: Duration, task: TimerTask) -> anyhow::Result<()> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);
        let key_owned = key.to_string();

        let mut timers_guard = lock(&self.timers);
        if let Some(existing) = timers_guard.remove(key) {
            existing.handle.abort();
        }

        let handle = self.runtime.spawn(async move {
            sleep(delay).await;
            let current = {
                let mut timers_guard = lock(&timers);
                match timers_guard.get(&key_owned) {
                    Some(armed) if armed.generation == generation => {
                        timers_guard.remove(&key_owned);
                        true
                    }
                    _ => false,
                }
            };
            if current {
                debug!(key = %key_owned, "timer elapsed");
                task();
            }
        });

        timers_guard.insert(
            key.to_string(),
            ArmedTimer {
                generation,
                handle: handle.abort_handle(),
            },
        );
        debug!(key, delay_ms = delay.as_millis() as u64, "timer started");
        Ok(())
    }

    fn stop(&self, key: &str) -> anyhow::Result<()> {
        if let Some(armed) = lock(&self.timers).remove(key) {
            armed.handle.abort();
            debug!(key, "timer stopped");
        }
        Ok(())
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, armed) in lock(&self.timers).drain() {
            armed.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn start_runs_task_after_delay() -> anyhow::Result<()> {
        let timer = TokioTimer::current()?;
        let fired = Arc::new(AtomicUsize::new(0));

        timer.start("idle", Duration::from_secs(5), counting_task(&fired))?;
        assert!(timer.is_armed("idle"));

        sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed("idle"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_timer() -> anyhow::Result<()> {
        let timer = TokioTimer::current()?;
        let fired = Arc::new(AtomicUsize::new(0));

        timer.start("idle", Duration::from_secs(5), counting_task(&fired))?;
        timer.stop("idle")?;
        sleep(Duration::from_secs(10)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.is_armed("idle"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn start_replaces_existing_timer_for_same_key() -> anyhow::Result<()> {
        let timer = TokioTimer::current()?;
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        timer.start("idle", Duration::from_secs(5), counting_task(&first))?;
        timer.start("idle", Duration::from_secs(10), counting_task(&second))?;

        sleep(Duration::from_secs(6)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert!(timer.is_armed("idle"));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() -> anyhow::Result<()> {
        let timer = TokioTimer::current()?;
        let a = Arc::new(AtomicUsize::new(0));
        let b = Arc::new(AtomicUsize::new(0));

        timer.start("a", Duration::from_secs(1), counting_task(&a))?;
        timer.start("b", Duration::from_secs(1), counting_task(&b))?;
        timer.stop("a")?;
        sleep(Duration::from_secs(2)).await;

        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
