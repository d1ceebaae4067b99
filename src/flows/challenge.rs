//! Challenges rendered to the flow interface.
//!
//! Every challenge is a JSON object whose `component` field names its type.
//! The [`ChallengeRegistry`] maps component tags to constructors so that a
//! challenge produced elsewhere (for example by a source's login button) can
//! be checked before it is embedded in another challenge.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("Challenge has no component")]
    MissingComponent,

    #[error("Unknown challenge component '{0}'")]
    UnknownComponent(String),

    #[error("Invalid {component} challenge: {message}")]
    Invalid { component: String, message: String },
}

/// A challenge that can be rendered by the flow interface.
pub trait LoginChallenge: fmt::Debug + Send + Sync {
    fn component(&self) -> &str;

    /// The serialized challenge, including its `component` field.
    fn to_value(&self) -> Value;
}

/// Component tag of [`RedirectChallenge`].
pub const REDIRECT_COMPONENT: &str = "xak-flow-redirect";

/// Sends the browser to another URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectChallenge {
    pub to: String,
}

impl LoginChallenge for RedirectChallenge {
    fn component(&self) -> &str {
        REDIRECT_COMPONENT
    }

    fn to_value(&self) -> Value {
        json!({"component": REDIRECT_COMPONENT, "to": self.to})
    }
}

/// Builds a challenge from its serialized form.
pub type ChallengeConstructor = fn(&Value) -> Result<Box<dyn LoginChallenge>, ChallengeError>;

fn construct_redirect(value: &Value) -> Result<Box<dyn LoginChallenge>, ChallengeError> {
    let challenge: RedirectChallenge =
        serde_json::from_value(value.clone()).map_err(|e| ChallengeError::Invalid {
            component: REDIRECT_COMPONENT.to_string(),
            message: e.to_string(),
        })?;
    if challenge.to.is_empty() {
        return Err(ChallengeError::Invalid {
            component: REDIRECT_COMPONENT.to_string(),
            message: "redirect target is empty".to_string(),
        });
    }
    Ok(Box::new(challenge))
}

/// Component tag to constructor mapping.
#[derive(Debug, Clone, Default)]
pub struct ChallengeRegistry {
    constructors: HashMap<String, ChallengeConstructor>,
}

impl ChallengeRegistry {
    /// A registry that knows no components.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in challenge types registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(REDIRECT_COMPONENT, construct_redirect);
        registry
    }

    pub fn register(&mut self, component: impl Into<String>, constructor: ChallengeConstructor) {
        self.constructors.insert(component.into(), constructor);
    }

    pub fn is_registered(&self, component: &str) -> bool {
        self.constructors.contains_key(component)
    }

    /// Construct a challenge from its serialized form.
    pub fn decode(&self, value: &Value) -> Result<Box<dyn LoginChallenge>, ChallengeError> {
        let component = value
            .get("component")
            .and_then(Value::as_str)
            .ok_or(ChallengeError::MissingComponent)?;
        let constructor = self
            .constructors
            .get(component)
            .ok_or_else(|| ChallengeError::UnknownComponent(component.to_string()))?;
        constructor(value)
    }

    /// Serialize `challenge` and check that it decodes again.
    pub fn validate(&self, challenge: &dyn LoginChallenge) -> Result<Value, ChallengeError> {
        let value = challenge.to_value();
        self.decode(&value)?;
        Ok(value)
    }
}
