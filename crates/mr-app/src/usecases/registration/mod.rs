//! Professional registration session use cases.

mod idle_timeout;
mod persistence;
mod session_store;

pub use idle_timeout::{IdleTimeoutController, IdleTimerState, IDLE_TIMER_KEY};
pub use session_store::RegistrationSessionStore;
