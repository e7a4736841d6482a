use super::step::RegistrationStep;
use super::validation::ValidationIssue;

/// Why a session operation was refused.
///
/// Precondition failures are expected in normal operation and fully
/// recoverable; callers that only need a yes/no use the boolean variants of
/// the store operations.
///
/// 会话操作被拒绝的原因（非异常，可恢复）。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    #[error("no active registration session")]
    NoSession,
    #[error("verification on cooldown for {remaining_secs}s")]
    OnCooldown { remaining_secs: u64 },
    #[error("maximum verification attempts reached ({attempts})")]
    MaxAttemptsReached { attempts: u32 },
    #[error("step {step} failed validation ({} issue(s))", issues.len())]
    ValidationFailed {
        step: RegistrationStep,
        issues: Vec<ValidationIssue>,
    },
}
