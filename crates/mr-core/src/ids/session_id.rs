use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Registration session identifier.
///
/// Opaque UUIDv4 string used only for external correlation (audit logs,
/// tracing fields). A new one is generated for every created session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrationSessionId(String);

impl_id!(RegistrationSessionId);
