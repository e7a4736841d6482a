//! Timing and throttling limits for a registration session.

use chrono::TimeDelta;

/// Session lifetime after the last activity (2 hours).
pub const DEFAULT_SESSION_TTL_SECS: u64 = 2 * 60 * 60;
/// Inactivity window before the idle watchdog tears the session down (2 hours).
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 2 * 60 * 60;
/// Attempts allowed per verification channel for the life of a session.
pub const DEFAULT_MAX_VERIFICATION_ATTEMPTS: u32 = 5;
/// Wait between two verification attempts on the same channel.
pub const DEFAULT_VERIFICATION_COOLDOWN_SECS: u64 = 60;

/// Limits applied by the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationPolicy {
    pub session_ttl_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_verification_attempts: u32,
    pub verification_cooldown_secs: u64,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            max_verification_attempts: DEFAULT_MAX_VERIFICATION_ATTEMPTS,
            verification_cooldown_secs: DEFAULT_VERIFICATION_COOLDOWN_SECS,
        }
    }
}

impl RegistrationPolicy {
    pub fn session_ttl(&self) -> TimeDelta {
        secs_to_delta(self.session_ttl_secs)
    }

    pub fn verification_cooldown(&self) -> TimeDelta {
        secs_to_delta(self.verification_cooldown_secs)
    }

    pub fn idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Saturates instead of panicking on absurdly large configured values.
fn secs_to_delta(secs: u64) -> TimeDelta {
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
    TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
}
