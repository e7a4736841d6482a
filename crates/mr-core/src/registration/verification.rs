//! Verification channel bookkeeping.
//!
//! The core never verifies anything itself. It records attempts reported by
//! the caller, throttles them, and stores the "verified" assertion made by
//! the external provider's integration code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::SessionRejection;
use super::policy::RegistrationPolicy;

/// One of the three independent verification tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationChannel {
    Email,
    Phone,
    Document,
}

impl VerificationChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            VerificationChannel::Email => "email",
            VerificationChannel::Phone => "phone",
            VerificationChannel::Document => "document",
        }
    }
}

impl std::fmt::Display for VerificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel verification record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationChannelState {
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    /// Attempts recorded since session creation. Never decremented.
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Document channel only: the identifier supplied when it was verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
}

impl VerificationChannelState {
    /// Locked for the rest of the session once the attempt budget is spent.
    pub fn is_locked(&self, policy: &RegistrationPolicy) -> bool {
        self.attempts >= policy.max_verification_attempts
    }

    /// Whole seconds left before the next attempt is accepted, rounded up.
    pub fn cooldown_remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        let Some(until) = self.cooldown_until else {
            return 0;
        };
        let millis = (until - now).num_milliseconds();
        if millis <= 0 {
            return 0;
        }
        u64::try_from(millis).map_or(0, |ms| ms.div_ceil(1000))
    }

    /// Check whether an attempt may be recorded now, without recording it.
    pub fn check_attempt(
        &self,
        now: DateTime<Utc>,
        policy: &RegistrationPolicy,
    ) -> Result<(), SessionRejection> {
        if self.is_locked(policy) {
            return Err(SessionRejection::MaxAttemptsReached {
                attempts: self.attempts,
            });
        }
        let remaining_secs = self.cooldown_remaining_secs(now);
        if remaining_secs > 0 {
            return Err(SessionRejection::OnCooldown { remaining_secs });
        }
        Ok(())
    }

    /// Record an attempt and start the cooldown window.
    ///
    /// Leaves the record untouched when the attempt is refused.
    pub fn record_attempt(
        &mut self,
        now: DateTime<Utc>,
        policy: &RegistrationPolicy,
    ) -> Result<(), SessionRejection> {
        self.check_attempt(now, policy)?;
        self.attempts += 1;
        self.last_attempt = Some(now);
        self.cooldown_until = Some(
            now.checked_add_signed(policy.verification_cooldown())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        Ok(())
    }
}

/// The three channel records of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationState {
    pub email: VerificationChannelState,
    pub phone: VerificationChannelState,
    pub document: VerificationChannelState,
}

impl VerificationState {
    pub fn channel(&self, channel: VerificationChannel) -> &VerificationChannelState {
        match channel {
            VerificationChannel::Email => &self.email,
            VerificationChannel::Phone => &self.phone,
            VerificationChannel::Document => &self.document,
        }
    }

    pub fn channel_mut(&mut self, channel: VerificationChannel) -> &mut VerificationChannelState {
        match channel {
            VerificationChannel::Email => &mut self.email,
            VerificationChannel::Phone => &mut self.phone,
            VerificationChannel::Document => &mut self.document,
        }
    }

    /// Record the caller's assertion that `channel` has been verified.
    ///
    /// `identifier` is kept only for the document channel.
    pub fn mark_verified(
        &mut self,
        channel: VerificationChannel,
        now: DateTime<Utc>,
        identifier: Option<&str>,
    ) {
        let state = self.channel_mut(channel);
        state.is_verified = true;
        state.verified_at = Some(now);
        if channel == VerificationChannel::Document {
            if let Some(identifier) = identifier {
                state.document_number = Some(identifier.to_string());
            }
        }
    }
}
