#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use mr_app::RegistrationSessionStore;
use mr_core::ports::{ClockPort, SessionEventPort, TimerPort, TimerTask};
use mr_core::{RegistrationDataPatch, RegistrationPolicy, SessionEvent};
use mr_infra::InMemorySessionBlobStore;

static TRACE_INIT: Once = Once::new();

/// Route store logs to the test writer; filter with RUST_LOG.
pub fn init_tracing() {
    TRACE_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Clock the test advances by hand.
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(start.timestamp_millis()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Timer that only fires when the test says so.
#[derive(Default)]
pub struct ManualTimer {
    armed: Mutex<HashMap<String, (Duration, TimerTask)>>,
    starts: AtomicI64,
}

impl ManualTimer {
    pub fn is_armed(&self, key: &str) -> bool {
        self.armed.lock().unwrap().contains_key(key)
    }

    pub fn armed_delay(&self, key: &str) -> Option<Duration> {
        self.armed.lock().unwrap().get(key).map(|(delay, _)| *delay)
    }

    pub fn start_count(&self) -> i64 {
        self.starts.load(Ordering::SeqCst)
    }

    /// Run the task armed under `key`, as if its delay elapsed.
    pub fn fire(&self, key: &str) -> bool {
        let task = self.armed.lock().unwrap().remove(key);
        match task {
            Some((_, task)) => {
                task();
                true
            }
            None => false,
        }
    }
}

impl TimerPort for ManualTimer {
    fn start(&self, key: &str, delay: Duration, task: TimerTask) -> anyhow::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.armed
            .lock()
            .unwrap()
            .insert(key.to_string(), (delay, task));
        Ok(())
    }

    fn stop(&self, key: &str) -> anyhow::Result<()> {
        self.armed.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl SessionEventPort for RecordingEvents {
    fn emit(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub blobs: Arc<InMemorySessionBlobStore>,
    pub clock: Arc<ManualClock>,
    pub timer: Arc<ManualTimer>,
    pub events: Arc<RecordingEvents>,
    pub policy: RegistrationPolicy,
    pub store: RegistrationSessionStore,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::default())
    }

    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        init_tracing();
        let blobs = Arc::new(InMemorySessionBlobStore::new());
        let clock = Arc::new(ManualClock::starting_at(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let timer = Arc::new(ManualTimer::default());
        let events = Arc::new(RecordingEvents::default());
        let store = build_store(&blobs, &clock, &timer, &events, policy);
        Self {
            blobs,
            clock,
            timer,
            events,
            policy,
            store,
        }
    }

    /// Simulate a restart: drop the store and build a new one over the same
    /// blob storage, clock and timer.
    pub fn reload(&mut self) {
        // The old store disarms the shared timer key on drop, so it has to go
        // before the new store arms it.
        let placeholder = build_store(
            &Arc::new(InMemorySessionBlobStore::new()),
            &self.clock,
            &Arc::new(ManualTimer::default()),
            &self.events,
            self.policy,
        );
        drop(std::mem::replace(&mut self.store, placeholder));
        self.store = build_store(
            &self.blobs,
            &self.clock,
            &self.timer,
            &self.events,
            self.policy,
        );
    }
}

fn build_store(
    blobs: &Arc<InMemorySessionBlobStore>,
    clock: &Arc<ManualClock>,
    timer: &Arc<ManualTimer>,
    events: &Arc<RecordingEvents>,
    policy: RegistrationPolicy,
) -> RegistrationSessionStore {
    RegistrationSessionStore::new(
        blobs.clone(),
        clock.clone(),
        timer.clone(),
        events.clone(),
        policy,
    )
}

pub fn valid_personal_info() -> RegistrationDataPatch {
    RegistrationDataPatch {
        first_name: Some("Ana".to_string()),
        last_name: Some("Souza".to_string()),
        email: Some("ana.souza@example.com".to_string()),
        phone: Some("+55 (11) 91234-5678".to_string()),
        password: Some("s3cure-pass".to_string()),
        confirm_password: Some("s3cure-pass".to_string()),
        ..Default::default()
    }
}
