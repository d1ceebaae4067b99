//! User records and identifier lookup.
//!
//! [`UserDirectory`] resolves a login identifier against a configurable set
//! of [`UserField`]s. Matches across fields are merged and the first record in
//! id order wins, so the result is deterministic when several users match.

use crate::storage::{MatchMode, StorageError, StorageKey, StorageProvider};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Storage kind under which users are kept.
pub const USER_KIND: &str = "User";

/// A stored user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Storage id; filled in on load.
    #[serde(skip)]
    pub pk: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            pk: Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            name: String::new(),
            is_active: true,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Fields an identifier may be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserField {
    Email,
    Username,
    Upn,
}

impl UserField {
    /// Dotted path of the field within a stored user.
    pub fn attribute_path(self) -> &'static str {
        match self {
            UserField::Email => "email",
            UserField::Username => "username",
            UserField::Upn => "attributes.upn",
        }
    }
}

/// The user an identification attempt resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingUser {
    /// An existing user matched the identifier.
    Existing(User),
    /// Nothing matched; only the submitted identifier is known.
    Placeholder { identifier: String },
}

impl PendingUser {
    pub fn username(&self) -> &str {
        match self {
            PendingUser::Existing(user) => &user.username,
            PendingUser::Placeholder { identifier } => identifier,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            PendingUser::Existing(user) => &user.email,
            PendingUser::Placeholder { identifier } => identifier,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            PendingUser::Existing(user) => Some(user),
            PendingUser::Placeholder { .. } => None,
        }
    }
}

/// Typed access to users in a tenant.
#[derive(Debug, Clone)]
pub struct UserDirectory<S> {
    storage: S,
}

impl<S> UserDirectory<S>
where
    S: StorageProvider<Error = StorageError>,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Store `user` under its `pk`.
    pub async fn save(&self, tenant_id: &str, user: &User) -> Result<(), StorageError> {
        let value = serde_json::to_value(user).map_err(|e| {
            StorageError::serialization(format!("Failed to encode user: {}", e), USER_KIND)
        })?;
        let key = StorageKey::new(tenant_id, USER_KIND, user.pk.clone());
        self.storage.put(key, value).await?;
        Ok(())
    }

    pub async fn get(&self, tenant_id: &str, pk: &str) -> Result<Option<User>, StorageError> {
        let key = StorageKey::new(tenant_id, USER_KIND, pk);
        match self.storage.get(key).await? {
            Some(value) => decode(pk, value).map(Some),
            None => Ok(None),
        }
    }

    /// Find the first user whose value at any of `fields` matches
    /// `identifier`. No fields means no match.
    pub async fn find(
        &self,
        tenant_id: &str,
        fields: &[UserField],
        identifier: &str,
        mode: MatchMode,
    ) -> Result<Option<User>, StorageError> {
        if fields.is_empty() {
            debug!("No user fields configured, not looking up {}", identifier);
            return Ok(None);
        }

        let mut matches = BTreeMap::new();
        for field in fields {
            let prefix = StorageKey::prefix(tenant_id, USER_KIND);
            let found = self
                .storage
                .find_by_attribute(prefix, field.attribute_path(), identifier, mode)
                .await?;
            for (key, value) in found {
                matches.entry(key.id().to_string()).or_insert(value);
            }
        }

        match matches.into_iter().next() {
            Some((pk, value)) => decode(&pk, value).map(Some),
            None => Ok(None),
        }
    }
}

fn decode(pk: &str, value: Value) -> Result<User, StorageError> {
    let mut user: User = serde_json::from_value(value).map_err(|e| {
        StorageError::serialization(format!("Failed to decode user: {}", e), USER_KIND)
    })?;
    user.pk = pk.to_string();
    Ok(user)
}
