//! Registration Application Layer
//!
//! This crate contains the registration session use cases: the session
//! store that owns the in-progress registration and the idle watchdog that
//! tears it down after inactivity.

pub mod usecases;

pub use usecases::{IdleTimeoutController, IdleTimerState, RegistrationSessionStore};
