//! Idle timeout controller.
//!
//! A single-purpose watchdog: fires a callback once a fixed period passes
//! without a reset. It knows nothing about session content.
//!
//! ```text
//! Idle --start/reset--> Armed --elapsed--> (callback) --> Idle
//!                       Armed --reset----> Armed (fresh deadline)
//!                       Armed --clear----> Idle
//! ```
//!
//! Every arm bumps a generation counter and the scheduled task carries the
//! generation it was armed with. A task that wakes up with a stale
//! generation does nothing, so a reset racing with an elapsing timer on a
//! multi-threaded runtime can never produce a late fire.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use mr_core::ports::TimerPort;
use tracing::{debug, info, warn};

/// Timer key used for the idle watchdog.
pub const IDLE_TIMER_KEY: &str = "registration.idle_timeout";

type TimeoutCallback = Arc<dyn Fn() + Send + Sync>;

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleTimerState {
    Idle,
    Armed,
}

#[derive(Default)]
struct IdleInner {
    on_timeout: Option<TimeoutCallback>,
    generation: u64,
    armed: bool,
}

pub struct IdleTimeoutController {
    timer: Arc<dyn TimerPort>,
    timeout: Duration,
    inner: Arc<Mutex<IdleInner>>,
}

impl IdleTimeoutController {
    pub fn new(timer: Arc<dyn TimerPort>, timeout: Duration) -> Self {
        Self {
            timer,
            timeout,
            inner: Arc::new(Mutex::new(IdleInner::default())),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Store `on_timeout` and arm a fresh timer for the full duration.
    pub fn start_timeout<F>(&self, on_timeout: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        inner.on_timeout = Some(Arc::new(on_timeout));
        self.arm(&mut inner);
    }

    /// Cancel the pending timer and re-arm it for the full duration.
    ///
    /// Does nothing until a callback has been registered.
    pub fn reset_timeout(&self) {
        let mut inner = self.lock();
        if inner.on_timeout.is_none() {
            return;
        }
        self.arm(&mut inner);
    }

    /// Cancel the pending timer without re-arming.
    pub fn clear_timeout(&self) {
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        if !inner.armed {
            return;
        }
        inner.armed = false;
        if let Err(err) = self.timer.stop(IDLE_TIMER_KEY) {
            warn!(error = %err, "failed to stop idle timer");
        }
        debug!("idle timer cleared");
    }

    /// Alias of [`reset_timeout`](Self::reset_timeout).
    pub fn extend_session(&self) {
        self.reset_timeout();
    }

    pub fn state(&self) -> IdleTimerState {
        if self.lock().armed {
            IdleTimerState::Armed
        } else {
            IdleTimerState::Idle
        }
    }

    // The controller lock is held across `TimerPort::start` so that two
    // concurrent arms cannot leave an older task installed under the key.
    fn arm(&self, inner: &mut IdleInner) {
        inner.generation = inner.generation.wrapping_add(1);
        let generation = inner.generation;
        let weak = Arc::downgrade(&self.inner);

        let task = Box::new(move || fire(&weak, generation));
        match self.timer.start(IDLE_TIMER_KEY, self.timeout, task) {
            Ok(()) => {
                inner.armed = true;
                debug!(
                    timeout_secs = self.timeout.as_secs(),
                    generation, "idle timer armed"
                );
            }
            Err(err) => {
                inner.armed = false;
                warn!(error = %err, "failed to arm idle timer");
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, IdleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for IdleTimeoutController {
    fn drop(&mut self) {
        self.clear_timeout();
    }
}

fn fire(inner: &Weak<Mutex<IdleInner>>, generation: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };
    let callback = {
        let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !guard.armed || guard.generation != generation {
            debug!(generation, "ignoring stale idle timer");
            return;
        }
        guard.armed = false;
        guard.on_timeout.clone()
    };

    info!(generation, "idle timeout elapsed");
    if let Some(callback) = callback {
        callback();
    }
}
