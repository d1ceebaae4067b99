//! Identification challenge and response payloads.

use crate::flows::FlowDesignation;
use crate::stages::captcha::CaptchaChallenge;
use crate::users::UserField;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Component tag of the identification challenge.
pub const IDENTIFICATION_COMPONENT: &str = "idp-stage-identification";

/// A source login button as rendered in the challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginSource {
    pub name: String,
    pub icon_url: Option<String>,
    pub challenge: Value,
}

/// What the identification form needs to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentificationChallenge {
    pub component: &'static str,
    pub user_fields: Vec<UserField>,
    pub password_fields: bool,
    pub allow_show_password: bool,
    pub captcha_stage: Option<CaptchaChallenge>,
    pub application_pre: Option<String>,
    pub flow_designation: FlowDesignation,
    pub primary_action: &'static str,
    pub enroll_url: Option<String>,
    pub recovery_url: Option<String>,
    pub passwordless_url: Option<String>,
    pub sources: Vec<LoginSource>,
    pub show_source_labels: bool,
    pub enable_remember_me: bool,
}

/// A submitted identification form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentificationChallengeResponse {
    pub uid_field: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

impl IdentificationChallengeResponse {
    pub fn new(uid_field: impl Into<String>) -> Self {
        Self {
            uid_field: uid_field.into(),
            ..Self::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_captcha_token(mut self, token: impl Into<String>) -> Self {
        self.captcha_token = Some(token.into());
        self
    }
}
