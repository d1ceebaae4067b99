//! Flow stages.

pub mod captcha;
pub mod identification;
pub mod password;

pub use captcha::{CaptchaError, CaptchaStage, CaptchaVerifier};
pub use identification::{IdentificationStage, IdentificationStageView};
pub use password::{Authenticator, PasswordStage, PermissionDenied};

use crate::flows::ChallengeError;
use crate::storage::StorageError;
use thiserror::Error;

/// The only message shown for failed identification or authentication.
pub const AUTHENTICATION_FAILED: &str = "Failed to authenticate.";

/// Errors returned by stage handlers.
#[derive(Debug, Error)]
pub enum StageError {
    /// The submitted response was rejected; `message` is shown to the user.
    #[error("{message}")]
    Validation { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid challenge: {0}")]
    Challenge(#[from] ChallengeError),
}

impl StageError {
    /// The generic failure used whenever an identity cannot be confirmed.
    pub fn authentication_failed() -> Self {
        StageError::Validation {
            message: AUTHENTICATION_FAILED.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        StageError::Validation {
            message: message.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StageError::Validation { .. })
    }
}
