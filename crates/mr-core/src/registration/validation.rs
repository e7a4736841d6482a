//! Per-step validation rules.
//!
//! The only business rules in the session core. Every function here is pure:
//! it reads the payload and the verification flags and never mutates them.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::data::RegistrationData;
use super::step::RegistrationStep;
use super::verification::{VerificationChannel, VerificationState};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_DOCUMENT_NUMBER_LEN: usize = 9;
pub const MIN_BIO_LEN: usize = 50;

/// Basic `local@domain.tld` shape; deliverability is checked by the email provider.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Brazilian numbers with the `+55` prefix: area code, optional leading 9, 8 digits.
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+55\s?\(?\d{2}\)?\s?9?\d{4}[-\s]?\d{4}$").expect("phone pattern is valid")
});

/// Outcome of the latest validation of one step.
///
/// Overwritten every time the step is (re-)validated; never used to block
/// re-validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepValidationRecord {
    pub is_valid: bool,
    pub validated_at: DateTime<Utc>,
    pub errors: Vec<String>,
}

impl StepValidationRecord {
    pub fn valid(at: DateTime<Utc>) -> Self {
        Self {
            is_valid: true,
            validated_at: at,
            errors: Vec::new(),
        }
    }

    pub fn from_issues(at: DateTime<Utc>, issues: &[ValidationIssue]) -> Self {
        Self {
            is_valid: issues.is_empty(),
            validated_at: at,
            errors: issues.iter().map(ToString::to_string).collect(),
        }
    }
}

/// A single reason a step failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("password must be at least {min_len} characters")]
    PasswordTooShort { min_len: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("email address is invalid")]
    InvalidEmail,
    #[error("phone number must use the +55 international format")]
    InvalidPhone,
    #[error("document number must be at least {min_len} characters")]
    DocumentNumberTooShort { min_len: usize },
    #[error("bio must be at least {min_len} characters")]
    BioTooShort { min_len: usize },
    #[error("{0} verification is not complete")]
    ChannelNotVerified(VerificationChannel),
}

/// Run the rules of `step` against `data` and the session's verification flags.
///
/// Returns every issue found; an empty list means the step is valid.
pub fn validate_step(
    step: RegistrationStep,
    data: &RegistrationData,
    verification: &VerificationState,
) -> Vec<ValidationIssue> {
    match step {
        RegistrationStep::PersonalInfo => validate_personal_info(data, verification),
        RegistrationStep::ProfessionalInfo => validate_professional_info(data, verification),
        RegistrationStep::SpecialtySelection => validate_specialty_selection(data),
        // Gate lives in the external identity-verification provider.
        RegistrationStep::IdentityVerification => Vec::new(),
    }
}

fn require(issues: &mut Vec<ValidationIssue>, fields: &[(&'static str, &str)]) {
    for (name, value) in fields {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::MissingField(*name));
        }
    }
}

fn require_verified(
    issues: &mut Vec<ValidationIssue>,
    verification: &VerificationState,
    channel: VerificationChannel,
) {
    if !verification.channel(channel).is_verified {
        issues.push(ValidationIssue::ChannelNotVerified(channel));
    }
}

fn validate_personal_info(
    data: &RegistrationData,
    verification: &VerificationState,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    require(
        &mut issues,
        &[
            ("first_name", data.first_name.as_str()),
            ("last_name", data.last_name.as_str()),
            ("email", data.email.as_str()),
            ("phone", data.phone.as_str()),
            ("password", data.password.as_str()),
            ("confirm_password", data.confirm_password.as_str()),
        ],
    );

    if !data.password.is_empty() && data.password.chars().count() < MIN_PASSWORD_LEN {
        issues.push(ValidationIssue::PasswordTooShort {
            min_len: MIN_PASSWORD_LEN,
        });
    }
    if data.password != data.confirm_password {
        issues.push(ValidationIssue::PasswordMismatch);
    }
    if !data.email.is_empty() && !EMAIL_PATTERN.is_match(&data.email) {
        issues.push(ValidationIssue::InvalidEmail);
    }
    if !data.phone.is_empty() && !PHONE_PATTERN.is_match(&data.phone) {
        issues.push(ValidationIssue::InvalidPhone);
    }

    require_verified(&mut issues, verification, VerificationChannel::Email);
    require_verified(&mut issues, verification, VerificationChannel::Phone);
    issues
}

fn validate_professional_info(
    data: &RegistrationData,
    verification: &VerificationState,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    require(
        &mut issues,
        &[
            ("document_number", data.document_number.as_str()),
            ("university", data.university.as_str()),
            ("graduation_year", data.graduation_year.as_str()),
            ("medical_board", data.medical_board.as_str()),
            ("bio", data.bio.as_str()),
        ],
    );

    if !data.document_number.is_empty()
        && data.document_number.chars().count() < MIN_DOCUMENT_NUMBER_LEN
    {
        issues.push(ValidationIssue::DocumentNumberTooShort {
            min_len: MIN_DOCUMENT_NUMBER_LEN,
        });
    }
    if !data.bio.is_empty() && data.bio.chars().count() < MIN_BIO_LEN {
        issues.push(ValidationIssue::BioTooShort {
            min_len: MIN_BIO_LEN,
        });
    }

    require_verified(&mut issues, verification, VerificationChannel::Document);
    issues
}

fn validate_specialty_selection(data: &RegistrationData) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    require(&mut issues, &[("specialty_id", data.specialty_id.as_str())]);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn personal() -> RegistrationData {
        RegistrationData {
            first_name: "Ana".into(),
            last_name: "Souza".into(),
            email: "ana.souza@clinica.com.br".into(),
            phone: "+55 11 91234-5678".into(),
            password: "s3cure-pass".into(),
            confirm_password: "s3cure-pass".into(),
            ..Default::default()
        }
    }

    fn professional() -> RegistrationData {
        RegistrationData {
            document_number: "CRM-SP-123456".into(),
            university: "USP".into(),
            graduation_year: "2015".into(),
            medical_board: "CRM-SP".into(),
            bio: "Cardiologist with ten years of experience in hospital and outpatient care."
                .into(),
            ..Default::default()
        }
    }

    fn verified(channels: &[VerificationChannel]) -> VerificationState {
        let mut state = VerificationState::default();
        for channel in channels {
            state.channel_mut(*channel).is_verified = true;
        }
        state
    }

    #[test]
    fn personal_info_passes_with_complete_data_and_verified_channels() {
        let verification = verified(&[VerificationChannel::Email, VerificationChannel::Phone]);
        let issues = validate_step(RegistrationStep::PersonalInfo, &personal(), &verification);
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn whitespace_only_required_field_counts_as_missing() {
        let verification = verified(&[VerificationChannel::Email, VerificationChannel::Phone]);
        let data = RegistrationData {
            first_name: "  ".into(),
            ..personal()
        };

        let issues = validate_step(RegistrationStep::PersonalInfo, &data, &verification);

        assert_eq!(issues, vec![ValidationIssue::MissingField("first_name")]);
    }

    #[test]
    fn personal_info_requires_both_contact_channels_verified() {
        let verification = verified(&[VerificationChannel::Email]);
        let issues = validate_step(RegistrationStep::PersonalInfo, &personal(), &verification);
        assert_eq!(
            issues,
            vec![ValidationIssue::ChannelNotVerified(VerificationChannel::Phone)]
        );
    }

    #[test]
    fn personal_info_reports_field_rules() {
        let data = RegistrationData {
            email: "not-an-email".into(),
            phone: "11 91234-5678".into(),
            password: "short".into(),
            confirm_password: "shorter".into(),
            ..personal()
        };
        let verification = verified(&[VerificationChannel::Email, VerificationChannel::Phone]);
        let issues = validate_step(RegistrationStep::PersonalInfo, &data, &verification);

        assert!(issues.contains(&ValidationIssue::PasswordTooShort { min_len: 8 }));
        assert!(issues.contains(&ValidationIssue::PasswordMismatch));
        assert!(issues.contains(&ValidationIssue::InvalidEmail));
        assert!(issues.contains(&ValidationIssue::InvalidPhone));
    }

    #[test]
    fn empty_personal_info_lists_every_missing_field() {
        let issues = validate_step(
            RegistrationStep::PersonalInfo,
            &RegistrationData::default(),
            &VerificationState::default(),
        );
        let missing = issues
            .iter()
            .filter(|issue| matches!(issue, ValidationIssue::MissingField(_)))
            .count();
        assert_eq!(missing, 6);
    }

    #[test]
    fn phone_pattern_accepts_common_brazilian_formats() {
        for phone in ["+5511912345678", "+55 (11) 91234-5678", "+55 21 3456 7890"] {
            assert!(PHONE_PATTERN.is_match(phone), "{phone} should match");
        }
        for phone in ["+1 415 555 0100", "5511912345678", "+55 11 1234"] {
            assert!(!PHONE_PATTERN.is_match(phone), "{phone} should not match");
        }
    }

    #[test]
    fn professional_info_requires_document_channel() {
        let issues = validate_step(
            RegistrationStep::ProfessionalInfo,
            &professional(),
            &VerificationState::default(),
        );
        assert_eq!(
            issues,
            vec![ValidationIssue::ChannelNotVerified(VerificationChannel::Document)]
        );

        let verification = verified(&[VerificationChannel::Document]);
        assert!(
            validate_step(RegistrationStep::ProfessionalInfo, &professional(), &verification)
                .is_empty()
        );
    }

    #[test]
    fn professional_info_enforces_lengths() {
        let data = RegistrationData {
            document_number: "12345".into(),
            bio: "Too short.".into(),
            ..professional()
        };
        let verification = verified(&[VerificationChannel::Document]);
        let issues = validate_step(RegistrationStep::ProfessionalInfo, &data, &verification);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::DocumentNumberTooShort { min_len: 9 },
                ValidationIssue::BioTooShort { min_len: 50 },
            ]
        );
    }

    #[test]
    fn specialty_selection_needs_an_identifier() {
        let empty = RegistrationData::default();
        let state = VerificationState::default();
        assert_eq!(
            validate_step(RegistrationStep::SpecialtySelection, &empty, &state),
            vec![ValidationIssue::MissingField("specialty_id")]
        );

        let chosen = RegistrationData {
            specialty_id: "cardiology".into(),
            ..Default::default()
        };
        assert!(validate_step(RegistrationStep::SpecialtySelection, &chosen, &state).is_empty());
    }

    #[test]
    fn identity_verification_is_always_satisfied_here() {
        assert!(validate_step(
            RegistrationStep::IdentityVerification,
            &RegistrationData::default(),
            &VerificationState::default()
        )
        .is_empty());
    }

    #[test]
    fn record_from_issues_renders_messages() {
        let record = StepValidationRecord::from_issues(
            at(),
            &[
                ValidationIssue::MissingField("bio"),
                ValidationIssue::ChannelNotVerified(VerificationChannel::Document),
            ],
        );
        assert!(!record.is_valid);
        assert_eq!(
            record.errors,
            vec![
                "bio is required".to_string(),
                "document verification is not complete".to_string()
            ]
        );
        assert!(StepValidationRecord::valid(at()).is_valid);
    }
}
