//! Registration session domain.
//!
//! Models one professional's progress through the registration wizard:
//! payload, ordered steps, per-step validation outcomes, and the three
//! verification channels with their throttling rules.

pub mod data;
pub mod error;
pub mod event;
pub mod policy;
pub mod session;
pub mod step;
pub mod validation;
pub mod verification;

pub use data::{RegistrationData, RegistrationDataPatch, SchedulePreferences};
pub use error::SessionRejection;
pub use event::SessionEvent;
pub use policy::RegistrationPolicy;
pub use session::RegistrationSession;
pub use step::RegistrationStep;
pub use validation::{validate_step, StepValidationRecord, ValidationIssue};
pub use verification::{VerificationChannel, VerificationChannelState, VerificationState};
