//! Tenant-scoped record storage.
//!
//! The `StorageProvider` trait is the persistence seam for everything this crate
//! keeps durably: blueprint instances, users looked up by the identification
//! stage, and the records that blueprint entries create. Providers only store
//! JSON documents under a hierarchical key; typed layers such as
//! [`BlueprintInstanceStore`](crate::blueprints::BlueprintInstanceStore) and
//! [`UserDirectory`](crate::users::UserDirectory) sit on top.
//!
//! # Example Usage
//!
//! ```rust
//! use idp_engine::storage::{InMemoryStorage, MatchMode, StorageKey, StorageProvider};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//!
//! let key = StorageKey::new("default", "User", "1");
//! storage.put(key.clone(), json!({"username": "akadmin"})).await?;
//!
//! let prefix = StorageKey::prefix("default", "User");
//! let found = storage
//!     .find_by_attribute(prefix, "username", "AKADMIN", MatchMode::CaseInsensitive)
//!     .await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats};

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// A hierarchical key identifying one stored record.
///
/// Records are organized as `tenant_id` → `kind` → `id`, which gives tenant
/// isolation for free.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    tenant_id: String,
    kind: String,
    id: String,
}

impl StorageKey {
    /// Create a new storage key.
    pub fn new(tenant_id: impl Into<String>, kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Get the tenant ID.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Get the record kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Get the record ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Create a prefix for listing records of a kind within a tenant.
    pub fn prefix(tenant_id: impl Into<String>, kind: impl Into<String>) -> StoragePrefix {
        StoragePrefix {
            tenant_id: tenant_id.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant_id, self.kind, self.id)
    }
}

/// A prefix for querying records by tenant and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePrefix {
    tenant_id: String,
    kind: String,
}

impl StoragePrefix {
    /// Get the tenant ID.
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Get the record kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.kind)
    }
}

/// How an attribute value is compared during [`StorageProvider::find_by_attribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Unicode-lowercased equality.
    CaseInsensitive,
}

impl MatchMode {
    /// Compare a stored value against a needle.
    pub fn matches(self, stored: &str, needle: &str) -> bool {
        match self {
            MatchMode::Exact => stored == needle,
            MatchMode::CaseInsensitive => stored.to_lowercase() == needle.to_lowercase(),
        }
    }
}

/// Core trait for storage providers.
///
/// Providers store opaque JSON documents; create and update are the same
/// `put`. Implementations must return list and find results ordered by record
/// id so that "first match" is stable across calls.
pub trait StorageProvider: Send + Sync {
    /// The error type returned by storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store data at the specified key and return the stored data.
    ///
    /// An existing record under the same key is replaced entirely.
    fn put(
        &self,
        key: StorageKey,
        data: Value,
    ) -> impl Future<Output = Result<Value, Self::Error>> + Send;

    /// Retrieve data by key, `None` if no record exists.
    fn get(&self, key: StorageKey)
    -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Delete data by key.
    ///
    /// Returns `true` if a record was deleted, `false` if none existed.
    fn delete(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// List records matching a prefix, ordered by id, with pagination.
    fn list(
        &self,
        prefix: StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<(StorageKey, Value)>, Self::Error>> + Send;

    /// Find records whose attribute at a dotted path equals `value`.
    ///
    /// Dotted paths traverse objects and array indices (`attributes.upn`,
    /// `emails.0`). Results are ordered by id.
    fn find_by_attribute(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &str,
        mode: MatchMode,
    ) -> impl Future<Output = Result<Vec<(StorageKey, Value)>, Self::Error>> + Send;

    /// Check if a record exists.
    fn exists(&self, key: StorageKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Count the records matching a prefix.
    fn count(&self, prefix: StoragePrefix)
    -> impl Future<Output = Result<usize, Self::Error>> + Send;

    /// List all tenant IDs that currently hold data.
    fn list_tenants(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;
}
