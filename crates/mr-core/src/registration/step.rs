//! Registration wizard steps.

use serde::{Deserialize, Serialize};

/// One ordered stage of the registration wizard.
///
/// The derived ordering is the canonical wizard order: navigation towards a
/// greater step is "forward" and is gated by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStep {
    PersonalInfo,
    ProfessionalInfo,
    SpecialtySelection,
    IdentityVerification,
}

impl RegistrationStep {
    /// All steps in canonical order.
    pub const ALL: [RegistrationStep; 4] = [
        RegistrationStep::PersonalInfo,
        RegistrationStep::ProfessionalInfo,
        RegistrationStep::SpecialtySelection,
        RegistrationStep::IdentityVerification,
    ];

    pub const fn first() -> Self {
        RegistrationStep::PersonalInfo
    }

    /// Zero-based position in the wizard.
    pub const fn index(self) -> usize {
        match self {
            RegistrationStep::PersonalInfo => 0,
            RegistrationStep::ProfessionalInfo => 1,
            RegistrationStep::SpecialtySelection => 2,
            RegistrationStep::IdentityVerification => 3,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Whether moving from `self` to `target` goes forward in the wizard.
    pub fn is_before(self, target: Self) -> bool {
        self < target
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RegistrationStep::PersonalInfo => "personal_info",
            RegistrationStep::ProfessionalInfo => "professional_info",
            RegistrationStep::SpecialtySelection => "specialty_selection",
            RegistrationStep::IdentityVerification => "identity_verification",
        }
    }
}

impl Default for RegistrationStep {
    fn default() -> Self {
        Self::first()
    }
}

impl std::fmt::Display for RegistrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
