use thiserror::Error;

use super::state_machine::WorkflowStage;
use crate::collaborators::{AnchoringError, StorageError, VerificationError};
use crate::report::ValidationError;

/// Every failure a workflow operation can surface
///
/// None of these are fatal: the workflow stays on its current stage with the
/// draft intact, and the user may retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("email verification failed: {0}")]
    EmailVerification(VerificationError),
    #[error("code verification failed: {0}")]
    CodeVerification(VerificationError),
    #[error("verification code did not match")]
    InvalidCode,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
    #[error("anchoring unavailable: {0}")]
    AnchoringUnavailable(#[from] AnchoringError),
    #[error("'{operation}' is not available during {stage}")]
    WrongStage {
        stage: WorkflowStage,
        operation: &'static str,
    },
}

impl WorkflowError {
    /// Message shown to the reporter
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Validation(ValidationError::InvalidEmail) => {
                "Please enter a valid email address.".to_string()
            }
            WorkflowError::Validation(ValidationError::CodeLength { expected, .. }) => {
                format!("Enter the {expected}-digit code sent to your email.")
            }
            WorkflowError::Validation(ValidationError::EmptyField(field)) => {
                format!("Please provide the {field}.")
            }
            WorkflowError::Validation(other) => format!("{}.", capitalize(&other.to_string())),
            WorkflowError::EmailVerification(_) => {
                "Failed to send verification code. Please try again.".to_string()
            }
            WorkflowError::InvalidCode => {
                "Invalid verification code. Please try again.".to_string()
            }
            WorkflowError::CodeVerification(VerificationError::RateLimited) => {
                "Too many attempts. Please wait a moment and try again.".to_string()
            }
            WorkflowError::CodeVerification(_) => {
                "Failed to verify code. Please try again.".to_string()
            }
            WorkflowError::StorageUnavailable(_) | WorkflowError::AnchoringUnavailable(_) => {
                "Failed to submit report. Please try again.".to_string()
            }
            WorkflowError::WrongStage { stage, .. } => {
                format!("That action is not available while on {stage}.")
            }
        }
    }

    /// Local failures never reached a collaborator
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WorkflowError::Validation(_) | WorkflowError::WrongStage { .. }
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
