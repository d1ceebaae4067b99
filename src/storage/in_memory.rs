//! In-memory storage implementation.
//!
//! Thread-safe `StorageProvider` backed by nested maps behind a tokio
//! `RwLock`. Used by tests, the validator binary and single-process
//! deployments that do not need durability.

use crate::storage::{MatchMode, StorageError, StorageKey, StoragePrefix, StorageProvider};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type KindMap = BTreeMap<String, Value>;

/// Thread-safe in-memory storage.
///
/// Structure: `tenant_id` → `kind` → `id` → `data`. The innermost map is a
/// `BTreeMap` so iteration is already ordered by id.
#[derive(Clone)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, HashMap<String, KindMap>>>>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage instance.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get storage statistics for debugging and monitoring.
    pub async fn stats(&self) -> InMemoryStorageStats {
        let data_guard = self.data.read().await;
        let mut stats = InMemoryStorageStats::default();

        for tenant_data in data_guard.values() {
            stats.tenant_count += 1;
            for kind_data in tenant_data.values() {
                stats.kind_count += 1;
                stats.total_records += kind_data.len();
            }
        }

        stats
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.data.write().await.clear();
    }

    /// Extract a nested attribute value from JSON data using dot notation.
    fn extract_attribute_value(data: &Value, attribute_path: &str) -> Option<String> {
        let mut current = data;

        for part in attribute_path.split('.') {
            current = match part.parse::<usize>() {
                Ok(index) => current.get(index)?,
                Err(_) => current.get(part)?,
            };
        }

        match current {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageProvider for InMemoryStorage {
    type Error = StorageError;

    async fn put(&self, key: StorageKey, data: Value) -> Result<Value, Self::Error> {
        if !data.is_object() {
            return Err(StorageError::invalid_data_with_cause(
                format!("refusing to store {}", key),
                "records must be JSON objects",
            ));
        }

        let mut data_guard = self.data.write().await;
        data_guard
            .entry(key.tenant_id().to_string())
            .or_default()
            .entry(key.kind().to_string())
            .or_default()
            .insert(key.id().to_string(), data.clone());

        Ok(data)
    }

    async fn get(&self, key: StorageKey) -> Result<Option<Value>, Self::Error> {
        let data_guard = self.data.read().await;

        Ok(data_guard
            .get(key.tenant_id())
            .and_then(|tenant_data| tenant_data.get(key.kind()))
            .and_then(|kind_data| kind_data.get(key.id()))
            .cloned())
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, Self::Error> {
        let mut data_guard = self.data.write().await;

        let existed = data_guard
            .get_mut(key.tenant_id())
            .and_then(|tenant_data| tenant_data.get_mut(key.kind()))
            .map(|kind_data| kind_data.remove(key.id()).is_some())
            .unwrap_or(false);

        Ok(existed)
    }

    async fn list(
        &self,
        prefix: StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(StorageKey, Value)>, Self::Error> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let data_guard = self.data.read().await;
        let Some(kind_data) = data_guard
            .get(prefix.tenant_id())
            .and_then(|tenant_data| tenant_data.get(prefix.kind()))
        else {
            return Ok(Vec::new());
        };

        Ok(kind_data
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(id, data)| {
                (
                    StorageKey::new(prefix.tenant_id(), prefix.kind(), id),
                    data.clone(),
                )
            })
            .collect())
    }

    async fn find_by_attribute(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &str,
        mode: MatchMode,
    ) -> Result<Vec<(StorageKey, Value)>, Self::Error> {
        if attribute.is_empty() {
            return Err(StorageError::invalid_query(
                "attribute path cannot be empty",
                attribute,
            ));
        }

        let data_guard = self.data.read().await;
        let Some(kind_data) = data_guard
            .get(prefix.tenant_id())
            .and_then(|tenant_data| tenant_data.get(prefix.kind()))
        else {
            return Ok(Vec::new());
        };

        Ok(kind_data
            .iter()
            .filter(|(_, data)| {
                Self::extract_attribute_value(data, attribute)
                    .is_some_and(|stored| mode.matches(&stored, value))
            })
            .map(|(id, data)| {
                (
                    StorageKey::new(prefix.tenant_id(), prefix.kind(), id),
                    data.clone(),
                )
            })
            .collect())
    }

    async fn exists(&self, key: StorageKey) -> Result<bool, Self::Error> {
        Ok(self.get(key).await?.is_some())
    }

    async fn count(&self, prefix: StoragePrefix) -> Result<usize, Self::Error> {
        let data_guard = self.data.read().await;

        Ok(data_guard
            .get(prefix.tenant_id())
            .and_then(|tenant_data| tenant_data.get(prefix.kind()))
            .map(|kind_data| kind_data.len())
            .unwrap_or(0))
    }

    async fn list_tenants(&self) -> Result<Vec<String>, Self::Error> {
        let data_guard = self.data.read().await;
        let mut tenants: Vec<String> = data_guard
            .iter()
            .filter(|(_, tenant_data)| tenant_data.values().any(|kind| !kind.is_empty()))
            .map(|(tenant_id, _)| tenant_id.clone())
            .collect();
        tenants.sort();
        Ok(tenants)
    }
}

/// Statistics about the current state of in-memory storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    /// Number of tenants with data
    pub tenant_count: usize,
    /// Number of record kinds across all tenants
    pub kind_count: usize,
    /// Total number of records
    pub total_records: usize,
}
