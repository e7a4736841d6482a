//! Registration session aggregate.
//!
//! Holds the whole state of one in-progress registration attempt. The
//! methods here are pure state transitions; timestamps come from the caller
//! and persistence, timers and notifications are the store's business.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::data::{RegistrationData, RegistrationDataPatch};
use super::error::SessionRejection;
use super::policy::RegistrationPolicy;
use super::step::RegistrationStep;
use super::validation::{validate_step, StepValidationRecord, ValidationIssue};
use super::verification::VerificationState;
use crate::ids::RegistrationSessionId;

/// The single in-progress registration attempt.
///
/// This is also the exact shape of the persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSession {
    pub id: RegistrationSessionId,
    #[serde(default)]
    pub data: RegistrationData,
    pub current_step: RegistrationStep,
    /// Steps that passed validation at least once. Only ever grows.
    #[serde(default)]
    pub completed_steps: BTreeSet<RegistrationStep>,
    #[serde(default)]
    pub verification_state: VerificationState,
    #[serde(default)]
    pub step_validation_state: BTreeMap<RegistrationStep, StepValidationRecord>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RegistrationSession {
    pub fn new(now: DateTime<Utc>, policy: &RegistrationPolicy) -> Self {
        Self {
            id: RegistrationSessionId::new(),
            data: RegistrationData::default(),
            current_step: RegistrationStep::first(),
            completed_steps: BTreeSet::new(),
            verification_state: VerificationState::default(),
            step_validation_state: BTreeMap::new(),
            created_at: now,
            last_activity: now,
            expires_at: expiry_from(now, policy),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expires_at - now).max(TimeDelta::zero())
    }

    /// Mark activity and push the expiry out by a full TTL.
    pub fn touch(&mut self, now: DateTime<Utc>, policy: &RegistrationPolicy) {
        self.last_activity = now;
        self.expires_at = expiry_from(now, policy);
    }

    pub fn apply_patch(&mut self, patch: RegistrationDataPatch) {
        patch.apply(&mut self.data);
    }

    /// Issues for `step` against the session's own payload.
    pub fn validate(&self, step: RegistrationStep) -> Vec<ValidationIssue> {
        validate_step(step, &self.data, &self.verification_state)
    }

    /// Issues for `step` against an arbitrary payload, using this session's
    /// verification flags.
    pub fn validate_with(
        &self,
        step: RegistrationStep,
        data: &RegistrationData,
    ) -> Vec<ValidationIssue> {
        validate_step(step, data, &self.verification_state)
    }

    /// Move to `target`.
    ///
    /// Going forward requires the current step to validate; going backward or
    /// staying put is always allowed. Nothing changes on refusal.
    pub fn navigate_to(&mut self, target: RegistrationStep) -> Result<(), SessionRejection> {
        if self.current_step.is_before(target) {
            let issues = self.validate(self.current_step);
            if !issues.is_empty() {
                return Err(SessionRejection::ValidationFailed {
                    step: self.current_step,
                    issues,
                });
            }
        }
        self.current_step = target;
        Ok(())
    }

    /// Idempotently mark `step` completed with a valid record at `now`.
    pub fn complete_step(&mut self, step: RegistrationStep, now: DateTime<Utc>) {
        self.completed_steps.insert(step);
        self.step_validation_state
            .insert(step, StepValidationRecord::valid(now));
    }

    /// Evaluate `step` and store the outcome, valid or not.
    pub fn record_step_validation(&mut self, step: RegistrationStep, now: DateTime<Utc>) -> bool {
        let issues = self.validate(step);
        let record = StepValidationRecord::from_issues(now, &issues);
        let is_valid = record.is_valid;
        self.step_validation_state.insert(step, record);
        is_valid
    }

    pub fn is_step_completed(&self, step: RegistrationStep) -> bool {
        self.completed_steps.contains(&step)
    }

    pub fn is_step_valid(&self, step: RegistrationStep) -> bool {
        self.step_validation_state
            .get(&step)
            .is_some_and(|record| record.is_valid)
    }

    /// Completed steps as a share of the whole wizard, 0..=100.
    pub fn progress_percent(&self) -> u8 {
        let total = RegistrationStep::ALL.len();
        let done = self.completed_steps.len().min(total);
        u8::try_from(done * 100 / total).unwrap_or(100)
    }
}

fn expiry_from(now: DateTime<Utc>, policy: &RegistrationPolicy) -> DateTime<Utc> {
    now.checked_add_signed(policy.session_ttl())
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
