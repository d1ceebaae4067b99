//! Blueprint importer.
//!
//! An [`Importer`] is built from raw blueprint content and the instance
//! context, validated with a dry run and then applied against a tenant's
//! storage. Each entry is stored under the kind its model maps to in the
//! [`ModelRegistry`], with an id derived from the entry's identifiers.
//!
//! # Example Usage
//!
//! ```rust
//! use idp_engine::blueprints::importer::{Importer, LogCapture, ModelRegistry};
//! use idp_engine::storage::InMemoryStorage;
//! use serde_json::Map;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let content = "version: 1\nentries:\n  - model: idp_core.group\n    identifiers:\n      name: admins\n";
//! let importer = Importer::from_string(content, &Map::new())?;
//!
//! let storage = InMemoryStorage::new();
//! let models = ModelRegistry::default();
//! let (valid, _logs) = importer.validate(&storage, "default", &models).await?;
//! assert!(valid);
//!
//! let mut logs = LogCapture::new();
//! assert!(importer.apply(&storage, "default", &models, &mut logs).await);
//! # Ok(())
//! # }
//! ```

pub mod logs;
pub mod model;
pub mod registry;
pub mod template;

pub use logs::{LogCapture, LogEvent, LogLevel};
pub use model::{Blueprint, BlueprintEntry, EntryState};
pub use registry::ModelRegistry;

use crate::blueprints::SUPPORTED_VERSION;
use crate::error::BlueprintError;
use crate::storage::{StorageError, StorageKey, StorageProvider};
use serde_json::{Map, Value};
use serde_yaml::Value as YamlValue;
use std::fmt;

/// A blueprint entry, or the document as a whole, is semantically invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInvalidError {
    pub message: String,
    pub entry: Option<usize>,
}

impl EntryInvalidError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            entry: None,
        }
    }

    pub fn at(mut self, entry: usize) -> Self {
        self.entry = Some(entry);
        self
    }
}

impl fmt::Display for EntryInvalidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.entry {
            Some(index) => write!(f, "Invalid blueprint entry {}: {}", index, self.message),
            None => write!(f, "Invalid blueprint: {}", self.message),
        }
    }
}

impl std::error::Error for EntryInvalidError {}

/// A parsed blueprint bound to its context.
#[derive(Debug, Clone)]
pub struct Importer {
    blueprint: Blueprint,
}

impl Importer {
    /// Parse blueprint content, resolving tags against the document context
    /// overlaid by `context`.
    pub fn from_string(content: &str, context: &Map<String, Value>) -> Result<Self, BlueprintError> {
        let mut mapping = match serde_yaml::from_str::<YamlValue>(content)? {
            YamlValue::Mapping(mapping) => mapping,
            YamlValue::Null => serde_yaml::Mapping::new(),
            _ => return Err(EntryInvalidError::new("Blueprint must be a mapping").into()),
        };

        let mut effective = match mapping.remove("context") {
            None => Map::new(),
            Some(block) => match template::resolve(&block, &Map::new())? {
                Value::Object(object) => object,
                Value::Null => Map::new(),
                _ => return Err(EntryInvalidError::new("context must be a mapping").into()),
            },
        };
        effective.extend(context.clone());

        let resolved = template::resolve(&YamlValue::Mapping(mapping), &effective)?;
        let mut blueprint: Blueprint = serde_json::from_value(resolved)?;
        blueprint.context = effective;

        Ok(Self { blueprint })
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Dry-run the blueprint without writing anything.
    ///
    /// Returns whether the blueprint is valid together with the events
    /// recorded while checking it.
    pub async fn validate<S>(
        &self,
        storage: &S,
        tenant_id: &str,
        models: &ModelRegistry,
    ) -> Result<(bool, Vec<LogEvent>), StorageError>
    where
        S: StorageProvider<Error = StorageError>,
    {
        let mut logs = LogCapture::new();

        if self.blueprint.version != SUPPORTED_VERSION {
            logs.record(
                LogEvent::new(LogLevel::Error, "unsupported_version")
                    .with("version", self.blueprint.version),
            );
        }

        for (index, entry) in self.blueprint.entries.iter().enumerate() {
            let Some(kind) = models.kind_for(&entry.model) else {
                logs.record(invalid(index, entry, "unknown model"));
                continue;
            };
            if entry.identifiers.is_empty() {
                logs.record(invalid(index, entry, "entry has no identifiers"));
                continue;
            }

            let key = StorageKey::new(tenant_id, kind, entry.record_id());
            if entry.state == EntryState::MustCreated && storage.exists(key).await? {
                logs.record(invalid(index, entry, "object already exists"));
                continue;
            }

            logs.record(
                LogEvent::new(LogLevel::Debug, "entry_valid")
                    .with("index", index)
                    .with("model", entry.model.as_str()),
            );
        }

        Ok((!logs.has_errors(), logs.into_events()))
    }

    /// Apply all entries in order, stopping at the first failure.
    ///
    /// Entries applied before a failure stay applied.
    pub async fn apply<S>(
        &self,
        storage: &S,
        tenant_id: &str,
        models: &ModelRegistry,
        logs: &mut LogCapture,
    ) -> bool
    where
        S: StorageProvider<Error = StorageError>,
    {
        for (index, entry) in self.blueprint.entries.iter().enumerate() {
            let Some(kind) = models.kind_for(&entry.model) else {
                logs.record(invalid(index, entry, "unknown model"));
                return false;
            };
            let key = StorageKey::new(tenant_id, kind, entry.record_id());

            match apply_entry(storage, key, entry).await {
                Ok(Some(event)) => logs.record(
                    LogEvent::new(event.level(), event.name())
                        .with("index", index)
                        .with("model", entry.model.as_str()),
                ),
                Ok(None) => {
                    logs.record(invalid(index, entry, "object already exists"));
                    return false;
                }
                Err(error) => {
                    logs.record(
                        LogEvent::new(LogLevel::Error, "entry_failed")
                            .with("index", index)
                            .with("model", entry.model.as_str())
                            .with("error", error.to_string()),
                    );
                    return false;
                }
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryOutcome {
    Created,
    Updated,
    Skipped,
    Deleted,
    AlreadyAbsent,
}

impl EntryOutcome {
    fn name(self) -> &'static str {
        match self {
            EntryOutcome::Created => "entry_created",
            EntryOutcome::Updated => "entry_updated",
            EntryOutcome::Skipped => "entry_skipped",
            EntryOutcome::Deleted => "entry_deleted",
            EntryOutcome::AlreadyAbsent => "entry_absent",
        }
    }

    fn level(self) -> LogLevel {
        match self {
            EntryOutcome::Skipped | EntryOutcome::AlreadyAbsent => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }
}

/// Apply one entry. `Ok(None)` means a must-create entry found its object.
async fn apply_entry<S>(
    storage: &S,
    key: StorageKey,
    entry: &BlueprintEntry,
) -> Result<Option<EntryOutcome>, StorageError>
where
    S: StorageProvider<Error = StorageError>,
{
    let outcome = match entry.state {
        EntryState::Present => match storage.get(key.clone()).await? {
            Some(Value::Object(mut existing)) => {
                existing.extend(entry.record());
                storage.put(key, Value::Object(existing)).await?;
                EntryOutcome::Updated
            }
            _ => {
                storage.put(key, Value::Object(entry.record())).await?;
                EntryOutcome::Created
            }
        },
        EntryState::Created => {
            if storage.exists(key.clone()).await? {
                EntryOutcome::Skipped
            } else {
                storage.put(key, Value::Object(entry.record())).await?;
                EntryOutcome::Created
            }
        }
        EntryState::MustCreated => {
            if storage.exists(key.clone()).await? {
                return Ok(None);
            }
            storage.put(key, Value::Object(entry.record())).await?;
            EntryOutcome::Created
        }
        EntryState::Absent => {
            if storage.delete(key).await? {
                EntryOutcome::Deleted
            } else {
                EntryOutcome::AlreadyAbsent
            }
        }
    };

    Ok(Some(outcome))
}

fn invalid(index: usize, entry: &BlueprintEntry, reason: &str) -> LogEvent {
    let mut event = LogEvent::new(LogLevel::Error, "entry_invalid")
        .with("index", index)
        .with("model", entry.model.as_str())
        .with("reason", reason);
    if let Some(id) = &entry.id {
        event = event.with("id", id.as_str());
    }
    event
}
