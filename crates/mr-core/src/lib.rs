//! # mr-core
//!
//! Core domain models and business rules for the professional registration
//! session.
//!
//! This crate contains pure business logic without any infrastructure
//! dependencies. Time, timers, persistence and notifications are reached
//! through the traits in [`ports`].

// Public module exports
pub mod config;
pub mod ids;
pub mod ports;
pub mod registration;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use ids::RegistrationSessionId;
pub use registration::{
    RegistrationData, RegistrationDataPatch, RegistrationPolicy, RegistrationSession,
    RegistrationStep, SessionEvent, SessionRejection, StepValidationRecord, VerificationChannel,
    VerificationChannelState,
};
