//! Identification stage configuration.

use crate::stages::captcha::CaptchaStage;
use crate::stages::password::PasswordStage;
use crate::users::UserField;
use serde::{Deserialize, Serialize};

/// Settings of one identification stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentificationStage {
    pub name: String,
    /// Fields an identifier is matched against; empty means nothing matches.
    #[serde(default)]
    pub user_fields: Vec<UserField>,
    #[serde(default = "enabled")]
    pub case_insensitive_matching: bool,
    /// Whether later stages may see which user matched.
    #[serde(default = "enabled")]
    pub show_matched_user: bool,
    /// Continue with unknown identifiers when no password is checked here.
    #[serde(default = "enabled")]
    pub pretend_user_exists: bool,
    #[serde(default)]
    pub password_stage: Option<PasswordStage>,
    #[serde(default)]
    pub captcha_stage: Option<CaptchaStage>,
    #[serde(default)]
    pub enrollment_flow: Option<String>,
    #[serde(default)]
    pub recovery_flow: Option<String>,
    #[serde(default)]
    pub passwordless_flow: Option<String>,
    #[serde(default)]
    pub show_source_labels: bool,
    #[serde(default)]
    pub enable_remember_me: bool,
}

fn enabled() -> bool {
    true
}

impl IdentificationStage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_fields: vec![UserField::Email, UserField::Username],
            case_insensitive_matching: true,
            show_matched_user: true,
            pretend_user_exists: true,
            password_stage: None,
            captcha_stage: None,
            enrollment_flow: None,
            recovery_flow: None,
            passwordless_flow: None,
            show_source_labels: false,
            enable_remember_me: false,
        }
    }

    pub fn with_user_fields(mut self, fields: impl Into<Vec<UserField>>) -> Self {
        self.user_fields = fields.into();
        self
    }

    pub fn with_case_insensitive_matching(mut self, enabled: bool) -> Self {
        self.case_insensitive_matching = enabled;
        self
    }

    pub fn with_show_matched_user(mut self, enabled: bool) -> Self {
        self.show_matched_user = enabled;
        self
    }

    pub fn with_pretend_user_exists(mut self, enabled: bool) -> Self {
        self.pretend_user_exists = enabled;
        self
    }

    pub fn with_password_stage(mut self, stage: PasswordStage) -> Self {
        self.password_stage = Some(stage);
        self
    }

    pub fn with_captcha_stage(mut self, stage: CaptchaStage) -> Self {
        self.captcha_stage = Some(stage);
        self
    }

    pub fn with_enrollment_flow(mut self, slug: impl Into<String>) -> Self {
        self.enrollment_flow = Some(slug.into());
        self
    }

    pub fn with_recovery_flow(mut self, slug: impl Into<String>) -> Self {
        self.recovery_flow = Some(slug.into());
        self
    }

    pub fn with_passwordless_flow(mut self, slug: impl Into<String>) -> Self {
        self.passwordless_flow = Some(slug.into());
        self
    }
}
