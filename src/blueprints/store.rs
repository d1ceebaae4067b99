//! Typed persistence for blueprint instances.

use crate::blueprints::instance::BlueprintInstance;
use crate::storage::{MatchMode, StorageError, StorageKey, StorageProvider};
use serde_json::Value;
use uuid::Uuid;

/// Storage kind under which instances are kept.
pub const INSTANCE_KIND: &str = "BlueprintInstance";

/// Reads and writes [`BlueprintInstance`] records in a tenant.
#[derive(Debug, Clone)]
pub struct BlueprintInstanceStore<S> {
    storage: S,
}

impl<S> BlueprintInstanceStore<S>
where
    S: StorageProvider<Error = StorageError>,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// The underlying storage provider.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn get(
        &self,
        tenant_id: &str,
        instance_uuid: Uuid,
    ) -> Result<Option<BlueprintInstance>, StorageError> {
        let key = StorageKey::new(tenant_id, INSTANCE_KIND, instance_uuid.to_string());
        self.storage.get(key).await?.map(decode).transpose()
    }

    /// First instance bound to `path`, in id order.
    pub async fn find_by_path(
        &self,
        tenant_id: &str,
        path: &str,
    ) -> Result<Option<BlueprintInstance>, StorageError> {
        Ok(self.by_path(tenant_id, path).await?.into_iter().next())
    }

    /// All enabled instances bound to `path`.
    pub async fn enabled_by_path(
        &self,
        tenant_id: &str,
        path: &str,
    ) -> Result<Vec<BlueprintInstance>, StorageError> {
        Ok(self
            .by_path(tenant_id, path)
            .await?
            .into_iter()
            .filter(|instance| instance.enabled)
            .collect())
    }

    pub async fn list(&self, tenant_id: &str) -> Result<Vec<BlueprintInstance>, StorageError> {
        let prefix = StorageKey::prefix(tenant_id, INSTANCE_KIND);
        self.storage
            .list(prefix, 0, usize::MAX)
            .await?
            .into_iter()
            .map(|(_, value)| decode(value))
            .collect()
    }

    pub async fn save(
        &self,
        tenant_id: &str,
        instance: &BlueprintInstance,
    ) -> Result<(), StorageError> {
        let value = serde_json::to_value(instance).map_err(|e| {
            StorageError::serialization(format!("Failed to encode instance: {}", e), INSTANCE_KIND)
        })?;
        let key = StorageKey::new(tenant_id, INSTANCE_KIND, instance.instance_uuid.to_string());
        self.storage.put(key, value).await?;
        Ok(())
    }

    pub async fn delete(&self, tenant_id: &str, instance_uuid: Uuid) -> Result<bool, StorageError> {
        let key = StorageKey::new(tenant_id, INSTANCE_KIND, instance_uuid.to_string());
        self.storage.delete(key).await
    }

    async fn by_path(
        &self,
        tenant_id: &str,
        path: &str,
    ) -> Result<Vec<BlueprintInstance>, StorageError> {
        let prefix = StorageKey::prefix(tenant_id, INSTANCE_KIND);
        self.storage
            .find_by_attribute(prefix, "path", path, MatchMode::Exact)
            .await?
            .into_iter()
            .map(|(_, value)| decode(value))
            .collect()
    }
}

fn decode(value: Value) -> Result<BlueprintInstance, StorageError> {
    serde_json::from_value(value).map_err(|e| {
        StorageError::serialization(format!("Failed to decode instance: {}", e), INSTANCE_KIND)
    })
}
