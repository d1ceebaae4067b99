//! Typed blueprint documents.

use crate::blueprints::SUPPORTED_VERSION;
use crate::blueprints::metadata::BlueprintMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A parsed blueprint with all tags resolved.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Blueprint {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub metadata: Option<BlueprintMetadata>,
    /// Effective context: document context overlaid by the instance context.
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub entries: Vec<BlueprintEntry>,
}

fn default_version() -> u64 {
    SUPPORTED_VERSION
}

/// Desired state of the object an entry describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Create the object or update it with `attrs`.
    #[default]
    Present,
    /// Create the object only if it does not exist.
    Created,
    /// Create the object, failing if it already exists.
    MustCreated,
    /// Delete the object if it exists.
    Absent,
}

/// One object declaration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BlueprintEntry {
    pub model: String,
    #[serde(default)]
    pub state: EntryState,
    #[serde(default)]
    pub identifiers: Map<String, Value>,
    #[serde(default)]
    pub attrs: Map<String, Value>,
    #[serde(default)]
    pub id: Option<String>,
}

impl BlueprintEntry {
    /// Stable storage id derived from the entry's identifiers.
    pub fn record_id(&self) -> String {
        let canonical = Value::Object(self.identifiers.clone()).to_string();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }

    /// The stored document: identifiers merged with attributes.
    pub fn record(&self) -> Map<String, Value> {
        let mut record = self.identifiers.clone();
        record.extend(self.attrs.clone());
        record
    }
}
