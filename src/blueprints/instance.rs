//! Persisted blueprint instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Outcome of the most recent apply of an instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueprintInstanceStatus {
    Successful,
    Error,
    #[default]
    Unknown,
}

/// A persisted record binding a blueprint source to its apply state.
///
/// An empty `last_applied_hash` means the instance was never applied
/// successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlueprintInstance {
    pub instance_uuid: Uuid,
    pub name: String,
    /// Path relative to the blueprint root, or a remote reference.
    #[serde(default)]
    pub path: String,
    /// Inline content, used instead of `path` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub status: BlueprintInstanceStatus,
    #[serde(default)]
    pub last_applied_hash: String,
    #[serde(default)]
    pub last_applied: Option<DateTime<Utc>>,
    /// Key/value pairs made available to `!Context` tags.
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub managed_models: Vec<String>,
}

impl BlueprintInstance {
    /// Create an enabled, never-applied instance for a blueprint path.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            instance_uuid: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            content: None,
            enabled: true,
            status: BlueprintInstanceStatus::Unknown,
            last_applied_hash: String::new(),
            last_applied: None,
            context: Map::new(),
            metadata: Map::new(),
            managed_models: Vec::new(),
        }
    }

    /// Create an instance carrying its content inline.
    pub fn with_content(name: impl Into<String>, content: impl Into<String>) -> Self {
        let mut instance = Self::new(name, "");
        instance.content = Some(content.into());
        instance
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the instance was applied from content with this digest.
    pub fn is_applied(&self, hash: &str) -> bool {
        !self.last_applied_hash.is_empty() && self.last_applied_hash == hash
    }
}
