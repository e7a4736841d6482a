//! Application configuration domain model

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::registration::policy::{
    RegistrationPolicy, DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_MAX_VERIFICATION_ATTEMPTS,
    DEFAULT_SESSION_TTL_SECS, DEFAULT_VERIFICATION_COOLDOWN_SECS,
};

/// Application configuration
///
/// Plain data as read from the configuration file. Missing sections and
/// keys fall back to the registration defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session lifetime settings
    pub session: SessionConfig,

    /// Verification throttling settings
    pub verification: VerificationConfig,

    /// Snapshot storage settings
    pub storage: StorageConfig,
}

/// Session lifetime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session stays valid after its last activity
    pub ttl_secs: u64,

    /// Seconds of inactivity before the idle watchdog tears the session down
    pub idle_timeout_secs: u64,
}

/// Verification throttling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Attempts allowed per channel for the life of a session
    pub max_attempts: u32,

    /// Seconds between two attempts on the same channel
    pub cooldown_secs: u64,
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the session snapshot; platform data dir when unset
    pub dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_SESSION_TTL_SECS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_VERIFICATION_ATTEMPTS,
            cooldown_secs: DEFAULT_VERIFICATION_COOLDOWN_SECS,
        }
    }
}

impl AppConfig {
    /// Limits applied by the session store.
    pub fn policy(&self) -> RegistrationPolicy {
        RegistrationPolicy {
            session_ttl_secs: self.session.ttl_secs,
            idle_timeout_secs: self.session.idle_timeout_secs,
            max_verification_attempts: self.verification.max_attempts,
            verification_cooldown_secs: self.verification.cooldown_secs,
        }
    }
}
