//! Host bootstrap for the registration session core.
//!
//! Loads configuration, installs tracing and assembles the session store
//! from its infrastructure adapters. UI layers depend on this crate and
//! talk to [`RegistrationRuntime`] only.

pub mod bootstrap;

pub use bootstrap::{
    init_tracing_subscriber, load_config, wire_registration, RegistrationRuntime,
};
