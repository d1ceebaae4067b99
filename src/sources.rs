//! Federated login sources.
//!
//! A [`Source`] can offer a login button on the identification stage. The
//! button is provided through the [`LoginButtonProvider`] capability; sources
//! without it are listed nowhere.

use crate::flows::{FlowRequest, LoginChallenge, RedirectChallenge};
use std::fmt;
use std::sync::Arc;

/// A login button rendered next to the identification form.
#[derive(Debug)]
pub struct UiLoginButton {
    pub name: String,
    pub icon_url: Option<String>,
    pub challenge: Box<dyn LoginChallenge>,
}

/// Capability of sources that can start a login from the identification
/// stage.
pub trait LoginButtonProvider: Send + Sync {
    fn button(&self, source: &Source, request: &FlowRequest) -> Option<UiLoginButton>;
}

/// Button that redirects to the source's login endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectLoginButton {
    pub login_url: String,
    pub icon_url: Option<String>,
}

impl LoginButtonProvider for RedirectLoginButton {
    fn button(&self, source: &Source, _request: &FlowRequest) -> Option<UiLoginButton> {
        Some(UiLoginButton {
            name: source.name.clone(),
            icon_url: self.icon_url.clone(),
            challenge: Box::new(RedirectChallenge {
                to: self.login_url.clone(),
            }),
        })
    }
}

/// A configured login source.
#[derive(Clone)]
pub struct Source {
    pub name: String,
    pub slug: String,
    pub enabled: bool,
    button: Option<Arc<dyn LoginButtonProvider>>,
}

impl Source {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            enabled: true,
            button: None,
        }
    }

    pub fn with_button(mut self, provider: Arc<dyn LoginButtonProvider>) -> Self {
        self.button = Some(provider);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// The login button for this source, if it is enabled and offers one.
    pub fn ui_login_button(&self, request: &FlowRequest) -> Option<UiLoginButton> {
        if !self.enabled {
            return None;
        }
        self.button.as_ref()?.button(self, request)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("slug", &self.slug)
            .field("enabled", &self.enabled)
            .field("button", &self.button.is_some())
            .finish()
    }
}
