//! Captcha verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Captcha provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaStage {
    pub name: String,
    pub public_key: String,
    pub js_url: String,
    #[serde(default)]
    pub interactive: bool,
}

/// The part of a captcha stage the browser needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptchaChallenge {
    pub site_key: String,
    pub js_url: String,
    pub interactive: bool,
}

impl From<&CaptchaStage> for CaptchaChallenge {
    fn from(stage: &CaptchaStage) -> Self {
        Self {
            site_key: stage.public_key.clone(),
            js_url: stage.js_url.clone(),
            interactive: stage.interactive,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CaptchaError {
    pub message: String,
}

impl CaptchaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Checks captcha tokens with the provider.
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(
        &self,
        stage: &CaptchaStage,
        token: &str,
        client_ip: &str,
    ) -> Result<(), CaptchaError>;
}
