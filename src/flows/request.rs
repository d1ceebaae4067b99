//! The HTTP-facing side of a flow step.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Session key holding the application the user is logging in to.
pub const SESSION_KEY_APPLICATION_PRE: &str = "application_pre";
/// Session key holding the query parameters the flow was started with.
pub const SESSION_KEY_GET: &str = "flow_get";

/// Request data visible to stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowRequest {
    pub client_ip: String,
    pub session: Map<String, Value>,
    pub query: BTreeMap<String, String>,
}

impl FlowRequest {
    pub fn new(client_ip: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            ..Self::default()
        }
    }

    pub fn with_session(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.session.insert(key.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Query the flow was started with, falling back to the current query.
    pub fn flow_query(&self) -> BTreeMap<String, String> {
        match self.session.get(SESSION_KEY_GET) {
            Some(Value::Object(stored)) => stored
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect(),
            _ => self.query.clone(),
        }
    }

    /// Name of the application the flow was started for, if any.
    pub fn application_pre(&self) -> Option<String> {
        match self.session.get(SESSION_KEY_APPLICATION_PRE)? {
            Value::String(name) => Some(name.clone()),
            Value::Object(application) => application
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }
}
