//! Password verification.

use crate::flows::FlowRequest;
use crate::users::User;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Password stage configuration used by the identification stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStage {
    pub name: String,
    /// Authentication backends to try, in order.
    pub backends: Vec<String>,
    #[serde(default)]
    pub allow_show_password: bool,
}

/// The authentication backend refused the user outright.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct PermissionDenied {
    pub message: String,
}

impl PermissionDenied {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Verifies a username and password against the configured backends.
///
/// `Ok(None)` means the credentials did not match.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(
        &self,
        request: &FlowRequest,
        backends: &[String],
        username: &str,
        password: &str,
    ) -> Result<Option<User>, PermissionDenied>;
}
