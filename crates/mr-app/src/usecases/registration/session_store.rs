//! Registration session store.
//!
//! Single source of truth for one in-progress professional registration.
//! Every operation is synchronous and runs to completion:
//!
//! 1. validate/mutate the in-memory session
//! 2. persist a snapshot (best effort)
//! 3. reset the idle watchdog
//!
//! Operations never fail across the public boundary. Each mutating
//! operation exists in two forms: a `try_*` variant returning the
//! reason-coded [`SessionRejection`], and a plain variant returning `bool`
//! for callers that only poll permission.
//!
//! 会话存储：所有操作同步执行，无会话或前置条件不满足时静默返回 false。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mr_core::ports::{ClockPort, SessionBlobStorePort, SessionEventPort, TimerPort};
use mr_core::registration::{validate_step, VerificationState};
use mr_core::{
    RegistrationData, RegistrationDataPatch, RegistrationPolicy, RegistrationSession,
    RegistrationSessionId, RegistrationStep, SessionEvent, SessionRejection,
    StepValidationRecord, VerificationChannel, VerificationChannelState,
};
use tracing::{debug, error, info, info_span};

use super::idle_timeout::IdleTimeoutController;
use super::persistence::SessionSnapshots;

struct StoreShared {
    session: Mutex<Option<RegistrationSession>>,
    snapshots: SessionSnapshots,
    clock: Arc<dyn ClockPort>,
    events: Arc<dyn SessionEventPort>,
    policy: RegistrationPolicy,
    idle: IdleTimeoutController,
}

impl StoreShared {
    fn lock(&self) -> MutexGuard<'_, Option<RegistrationSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Teardown bound to the idle watchdog armed for `armed_for`.
    ///
    /// A timer task may pass the controller's generation check just before
    /// a new session is installed or the live one is touched. A watchdog
    /// armed for a replaced session does nothing; one that finds recent
    /// activity re-arms instead of tearing down.
    fn on_idle_timeout(&self, armed_for: &RegistrationSessionId) {
        let mut guard = self.lock();
        let Some(live) = guard.as_ref() else {
            return;
        };
        if live.id != *armed_for {
            debug!(
                session_id = %live.id,
                stale_session_id = %armed_for,
                "ignoring idle timeout armed for a replaced session"
            );
            return;
        }

        let idle_for = self.clock.now() - live.last_activity;
        let idle_elapsed = idle_for
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.policy.idle_timeout());
        if !idle_elapsed {
            debug!(
                session_id = %live.id,
                idle_ms = idle_for.num_milliseconds(),
                "activity since idle timer was armed, re-arming"
            );
            drop(guard);
            self.idle.reset_timeout();
            return;
        }

        let Some(session) = guard.take() else {
            return;
        };
        drop(guard);
        self.snapshots.remove();
        info!(session_id = %session.id, "registration session timed out");
        self.events.emit(SessionEvent::TimedOut);
    }
}

pub struct RegistrationSessionStore {
    shared: Arc<StoreShared>,
}

impl RegistrationSessionStore {
    /// Build a store and restore any persisted session.
    ///
    /// A live snapshot is adopted and its idle watchdog armed; an expired
    /// snapshot is purged; an unreadable snapshot is logged, removed and
    /// treated as absent.
    pub fn new(
        blobs: Arc<dyn SessionBlobStorePort>,
        clock: Arc<dyn ClockPort>,
        timer: Arc<dyn TimerPort>,
        events: Arc<dyn SessionEventPort>,
        policy: RegistrationPolicy,
    ) -> Self {
        let store = Self {
            shared: Arc::new(StoreShared {
                session: Mutex::new(None),
                snapshots: SessionSnapshots::new(blobs),
                clock,
                events,
                policy,
                idle: IdleTimeoutController::new(timer, policy.idle_timeout()),
            }),
        };
        store.restore();
        store
    }

    pub fn policy(&self) -> &RegistrationPolicy {
        &self.shared.policy
    }

    pub fn idle_timeout(&self) -> &IdleTimeoutController {
        &self.shared.idle
    }

    // ----- lifecycle -----

    /// Start a fresh session, discarding any existing one (no merge).
    pub fn create_session(&self) -> RegistrationSessionId {
        let now = self.shared.clock.now();
        let session = RegistrationSession::new(now, &self.shared.policy);
        let id = session.id.clone();
        let _span = info_span!("usecase.registration.create_session", session_id = %id).entered();

        let previous = {
            let mut guard = self.shared.lock();
            self.shared.snapshots.save(&session);
            guard.replace(session)
        };
        self.start_idle_watchdog(id.clone());

        info!(
            session_id = %id,
            replaced = ?previous.as_ref().map(|s| &s.id),
            "registration session created"
        );
        id
    }

    /// Destroy the in-memory session and its snapshot unconditionally.
    pub fn clear_session(&self) {
        let previous = self.shared.lock().take();
        self.shared.snapshots.remove();
        self.shared.idle.clear_timeout();
        if let Some(session) = previous {
            info!(session_id = %session.id, "registration session cleared");
        }
    }

    pub fn try_extend_session(&self) -> Result<(), SessionRejection> {
        self.mutate("extend_session", |_, _, _| Ok(()))
    }

    /// Push expiry out by a full TTL and reset the idle watchdog.
    pub fn extend_session(&self) -> bool {
        self.try_extend_session().is_ok()
    }

    // ----- reads -----

    /// Snapshot of the live session, `None` when absent or expired.
    pub fn current_session(&self) -> Option<RegistrationSession> {
        self.read(|session, _| session.clone())
    }

    pub fn data(&self) -> Option<RegistrationData> {
        self.read(|session, _| session.data.clone())
    }

    pub fn current_step(&self) -> Option<RegistrationStep> {
        self.read(|session, _| session.current_step)
    }

    pub fn is_step_completed(&self, step: RegistrationStep) -> bool {
        self.read(|session, _| session.is_step_completed(step))
            .unwrap_or(false)
    }

    pub fn is_step_valid(&self, step: RegistrationStep) -> bool {
        self.read(|session, _| session.is_step_valid(step))
            .unwrap_or(false)
    }

    pub fn verification_status(
        &self,
        channel: VerificationChannel,
    ) -> Option<VerificationChannelState> {
        self.read(|session, _| session.verification_state.channel(channel).clone())
    }

    /// Seconds until `channel` accepts another attempt; 0 when it already does.
    pub fn verification_cooldown(&self, channel: VerificationChannel) -> u64 {
        self.read(|session, now| {
            session
                .verification_state
                .channel(channel)
                .cooldown_remaining_secs(now)
        })
        .unwrap_or(0)
    }

    pub fn can_attempt_verification(&self, channel: VerificationChannel) -> bool {
        let policy = self.shared.policy;
        self.read(|session, now| {
            session
                .verification_state
                .channel(channel)
                .check_attempt(now, &policy)
                .is_ok()
        })
        .unwrap_or(false)
    }

    pub fn progress_percent(&self) -> u8 {
        self.read(|session, _| session.progress_percent())
            .unwrap_or(0)
    }

    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.read(|session, now| {
            session
                .time_until_expiry(now)
                .to_std()
                .unwrap_or_default()
        })
    }

    // ----- validation (pure) -----

    pub fn validate_current_step(&self) -> bool {
        self.read(|session, _| session.validate(session.current_step).is_empty())
            .unwrap_or(false)
    }

    /// Validate `data` against the rules of `step`.
    ///
    /// Uses the live session's verification flags; without a session every
    /// channel counts as unverified.
    pub fn validate_step(&self, step: RegistrationStep, data: &RegistrationData) -> bool {
        self.read(|session, _| session.validate_with(step, data).is_empty())
            .unwrap_or_else(|| validate_step(step, data, &VerificationState::default()).is_empty())
    }

    /// Full validation report for `step` against the current payload.
    pub fn check_step(&self, step: RegistrationStep) -> Option<StepValidationRecord> {
        self.read(|session, now| StepValidationRecord::from_issues(now, &session.validate(step)))
    }

    // ----- mutations -----

    pub fn try_update_data(&self, patch: RegistrationDataPatch) -> Result<(), SessionRejection> {
        self.mutate("update_data", |session, _, _| {
            session.apply_patch(patch);
            Ok(())
        })
    }

    /// Shallow-merge `patch` into the payload.
    pub fn update_data(&self, patch: RegistrationDataPatch) -> bool {
        self.try_update_data(patch).is_ok()
    }

    pub fn try_navigate_to_step(&self, target: RegistrationStep) -> Result<(), SessionRejection> {
        self.mutate("navigate_to_step", |session, _, _| {
            let from = session.current_step;
            session.navigate_to(target)?;
            info!(session_id = %session.id, %from, to = %target, "registration step changed");
            Ok(())
        })
    }

    /// Move to `target`; forward moves require the current step to validate.
    pub fn navigate_to_step(&self, target: RegistrationStep) -> bool {
        self.try_navigate_to_step(target).is_ok()
    }

    pub fn try_complete_step(&self, step: RegistrationStep) -> Result<(), SessionRejection> {
        self.mutate("complete_step", |session, now, _| {
            session.complete_step(step, now);
            Ok(())
        })
    }

    /// Mark `step` completed with a valid validation record.
    pub fn complete_step(&self, step: RegistrationStep) -> bool {
        self.try_complete_step(step).is_ok()
    }

    /// Evaluate `step` and store its validation record, valid or not.
    ///
    /// Returns whether the step is valid; `false` as well without a session.
    pub fn validate_and_record_step(&self, step: RegistrationStep) -> bool {
        self.mutate("validate_and_record_step", |session, now, _| {
            Ok(session.record_step_validation(step, now))
        })
        .unwrap_or(false)
    }

    pub fn try_mark_verification_complete(
        &self,
        channel: VerificationChannel,
        identifier: Option<&str>,
    ) -> Result<(), SessionRejection> {
        self.mutate("mark_verification_complete", |session, now, _| {
            session
                .verification_state
                .mark_verified(channel, now, identifier);
            info!(session_id = %session.id, %channel, "verification channel marked complete");
            Ok(())
        })
    }

    /// Record the caller's assertion that `channel` is verified.
    pub fn mark_verification_complete(
        &self,
        channel: VerificationChannel,
        identifier: Option<&str>,
    ) -> bool {
        self.try_mark_verification_complete(channel, identifier)
            .is_ok()
    }

    pub fn try_record_verification_attempt(
        &self,
        channel: VerificationChannel,
    ) -> Result<(), SessionRejection> {
        self.mutate("record_verification_attempt", |session, now, policy| {
            let state = session.verification_state.channel_mut(channel);
            state.record_attempt(now, policy)?;
            debug!(
                session_id = %session.id,
                %channel,
                attempts = state.attempts,
                "verification attempt recorded"
            );
            Ok(())
        })
    }

    /// Count an attempt on `channel`, unless throttled.
    pub fn record_verification_attempt(&self, channel: VerificationChannel) -> bool {
        self.try_record_verification_attempt(channel).is_ok()
    }

    // ----- internals -----

    fn read<T>(&self, f: impl FnOnce(&RegistrationSession, DateTime<Utc>) -> T) -> Option<T> {
        let now = self.shared.clock.now();
        let guard = self.shared.lock();
        guard
            .as_ref()
            .filter(|session| !session.is_expired(now))
            .map(|session| f(session, now))
    }

    /// Run `f` against the live session, then touch, persist and reset the
    /// idle watchdog. Nothing is touched or persisted when `f` refuses.
    fn mutate<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(
            &mut RegistrationSession,
            DateTime<Utc>,
            &RegistrationPolicy,
        ) -> Result<T, SessionRejection>,
    ) -> Result<T, SessionRejection> {
        let now = self.shared.clock.now();
        let policy = self.shared.policy;

        let value = {
            let mut guard = self.shared.lock();
            let expired = match guard.as_ref() {
                None => {
                    debug!(operation, "ignored: no registration session");
                    return Err(SessionRejection::NoSession);
                }
                Some(session) => session.is_expired(now),
            };
            if expired {
                let stale = guard.take();
                drop(guard);
                self.purge_expired(stale);
                return Err(SessionRejection::NoSession);
            }

            let Some(session) = guard.as_mut() else {
                return Err(SessionRejection::NoSession);
            };
            let value = f(&mut *session, now, &policy).map_err(|rejection| {
                debug!(
                    session_id = %session.id,
                    operation,
                    reason = %rejection,
                    "registration operation refused"
                );
                rejection
            })?;
            session.touch(now, &policy);
            self.shared.snapshots.save(session);
            value
        };

        self.shared.idle.reset_timeout();
        Ok(value)
    }

    fn purge_expired(&self, stale: Option<RegistrationSession>) {
        self.shared.snapshots.remove();
        self.shared.idle.clear_timeout();
        if let Some(session) = stale {
            info!(
                session_id = %session.id,
                expires_at = %session.expires_at,
                "expired registration session purged"
            );
        }
        self.shared.events.emit(SessionEvent::Expired);
    }

    fn start_idle_watchdog(&self, armed_for: RegistrationSessionId) {
        let shared = Arc::downgrade(&self.shared);
        self.shared.idle.start_timeout(move || {
            if let Some(shared) = shared.upgrade() {
                shared.on_idle_timeout(&armed_for);
            }
        });
    }

    fn restore(&self) {
        let now = self.shared.clock.now();
        match self.shared.snapshots.load() {
            Ok(None) => {
                debug!("no persisted registration session");
            }
            Ok(Some(session)) if session.is_expired(now) => {
                self.purge_expired(Some(session));
            }
            Ok(Some(session)) => {
                info!(
                    session_id = %session.id,
                    step = %session.current_step,
                    "registration session restored"
                );
                let id = session.id.clone();
                *self.shared.lock() = Some(session);
                self.start_idle_watchdog(id);
            }
            Err(err) => {
                error!(error = ?err, "discarding unreadable registration session snapshot");
                self.shared.snapshots.remove();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::TimeZone;
    use mr_core::ports::TimerTask;
    use mr_infra::InMemorySessionBlobStore;

    struct FixedClock(AtomicI64);

    impl ClockPort for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct CountingTimer {
        starts: AtomicI64,
    }

    impl TimerPort for CountingTimer {
        fn start(&self, _key: &str, _delay: Duration, _task: TimerTask) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEvents(Mutex<Vec<SessionEvent>>);

    impl SessionEventPort for RecordingEvents {
        fn emit(&self, event: SessionEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    struct Fixture {
        clock: Arc<FixedClock>,
        timer: Arc<CountingTimer>,
        events: Arc<RecordingEvents>,
        store: RegistrationSessionStore,
    }

    fn fixture() -> Fixture {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(FixedClock(AtomicI64::new(start.timestamp_millis())));
        let timer = Arc::new(CountingTimer::default());
        let events = Arc::new(RecordingEvents::default());
        let store = RegistrationSessionStore::new(
            Arc::new(InMemorySessionBlobStore::new()),
            clock.clone(),
            timer.clone(),
            events.clone(),
            RegistrationPolicy::default(),
        );
        Fixture {
            clock,
            timer,
            events,
            store,
        }
    }

    fn advance(clock: &FixedClock, by: Duration) {
        clock.0.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }

    #[test]
    fn late_watchdog_of_replaced_session_leaves_new_session_alone() {
        let fx = fixture();
        let replaced = fx.store.create_session();
        advance(&fx.clock, Duration::from_secs(30 * 60));
        let current = fx.store.create_session();

        fx.store.shared.on_idle_timeout(&replaced);

        assert_eq!(fx.store.current_session().map(|s| s.id), Some(current));
        assert!(fx.events.0.lock().unwrap().is_empty());
    }

    #[test]
    fn late_watchdog_after_fresh_activity_rearms() {
        let fx = fixture();
        let id = fx.store.create_session();
        advance(&fx.clock, Duration::from_secs(30 * 60));
        assert!(fx.store.extend_session());
        let starts = fx.timer.starts.load(Ordering::SeqCst);

        fx.store.shared.on_idle_timeout(&id);

        assert_eq!(fx.store.current_session().map(|s| s.id), Some(id));
        assert!(fx.events.0.lock().unwrap().is_empty());
        assert_eq!(fx.timer.starts.load(Ordering::SeqCst), starts + 1);
    }

    #[test]
    fn watchdog_tears_down_session_idle_for_full_period() {
        let fx = fixture();
        let id = fx.store.create_session();
        advance(&fx.clock, fx.store.policy().idle_timeout());

        fx.store.shared.on_idle_timeout(&id);

        assert!(fx.store.current_session().is_none());
        assert_eq!(*fx.events.0.lock().unwrap(), vec![SessionEvent::TimedOut]);
    }
}
