//! Apply: retrieve, validate and import one instance.

use crate::blueprints::engine::BlueprintEngine;
use crate::blueprints::hashing::digest;
use crate::blueprints::importer::{Importer, LogCapture};
use crate::blueprints::instance::{BlueprintInstance, BlueprintInstanceStatus};
use crate::blueprints::tasks::{SystemTask, TaskResult, TaskStatus, slugify};
use crate::error::BlueprintError;
use crate::storage::{StorageError, StorageProvider};
use chrono::Utc;
use log::{debug, info, warn};
use uuid::Uuid;

/// Task name recorded for apply runs.
pub const APPLY_TASK: &str = "apply_blueprint";

impl<S> BlueprintEngine<S>
where
    S: StorageProvider<Error = StorageError>,
{
    /// Apply the instance `instance_id`.
    ///
    /// Missing or disabled instances are a no-op that leaves no result
    /// record. Any recognized failure is
    /// recorded on the instance as an error status. Once loaded, the instance
    /// is saved back whatever the outcome.
    pub async fn apply(&self, tenant_id: &str, instance_id: Uuid) -> TaskResult {
        let mut task = SystemTask::new(APPLY_TASK).without_save_on_success();
        let mut loaded = None;

        if let Err(error) = self
            .apply_instance(tenant_id, instance_id, &mut task, &mut loaded)
            .await
        {
            warn!("Failed to apply blueprint {}: {}", instance_id, error);
            if let Some(instance) = loaded.as_mut() {
                instance.status = BlueprintInstanceStatus::Error;
            }
            task.set_error(&error);
        }

        if let Some(instance) = &loaded {
            if let Err(error) = self.store().save(tenant_id, instance).await {
                warn!("Failed to save blueprint instance {}: {}", instance.name, error);
                task.set_error(&BlueprintError::from(error));
            }
        }

        self.results().record(task).await
    }

    async fn apply_instance(
        &self,
        tenant_id: &str,
        instance_id: Uuid,
        task: &mut SystemTask,
        loaded: &mut Option<BlueprintInstance>,
    ) -> Result<(), BlueprintError> {
        let Some(found) = self.store().get(tenant_id, instance_id).await? else {
            debug!("Blueprint instance {} no longer exists", instance_id);
            task.set_status(TaskStatus::Successful, Vec::<String>::new());
            return Ok(());
        };
        if !found.enabled {
            debug!("Blueprint instance {} is disabled", found.name);
            task.set_status(TaskStatus::Successful, Vec::<String>::new());
            return Ok(());
        }

        let instance = loaded.insert(found);
        task.set_uid(slugify(&instance.name));

        let content = self.retriever().retrieve(instance).await?;
        let file_hash = digest(content.as_bytes());
        let importer = Importer::from_string(&content, &instance.context)?;
        if let Some(metadata) = &importer.blueprint().metadata {
            instance.metadata = metadata.to_map();
        }

        let storage = self.store().storage();
        let (valid, logs) = importer.validate(storage, tenant_id, self.models()).await?;
        if !valid {
            instance.status = BlueprintInstanceStatus::Error;
            task.set_status(TaskStatus::Error, logs.iter().map(ToString::to_string));
            return Ok(());
        }

        let mut capture = LogCapture::new();
        if !importer
            .apply(storage, tenant_id, self.models(), &mut capture)
            .await
        {
            instance.status = BlueprintInstanceStatus::Error;
            task.set_status(
                TaskStatus::Error,
                capture.events().iter().map(ToString::to_string),
            );
            return Ok(());
        }

        let mut managed: Vec<String> = importer
            .blueprint()
            .entries
            .iter()
            .map(|entry| entry.model.clone())
            .collect();
        managed.sort();
        managed.dedup();

        info!("Applied blueprint {} in tenant {}", instance.name, tenant_id);
        instance.status = BlueprintInstanceStatus::Successful;
        instance.last_applied_hash = file_hash;
        instance.last_applied = Some(Utc::now());
        instance.managed_models = managed;
        task.set_status(TaskStatus::Successful, Vec::<String>::new());
        Ok(())
    }
}
