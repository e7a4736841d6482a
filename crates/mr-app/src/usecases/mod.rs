pub mod registration;

pub use registration::{
    IdleTimeoutController, IdleTimerState, RegistrationSessionStore, IDLE_TIMER_KEY,
};
