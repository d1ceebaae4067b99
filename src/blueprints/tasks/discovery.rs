//! Discovery: reconcile scanned blueprint files with persisted instances.

use crate::blueprints::engine::BlueprintEngine;
use crate::blueprints::instance::BlueprintInstance;
use crate::blueprints::scanner::BlueprintFile;
use crate::blueprints::tasks::{BlueprintTask, SystemTask, TaskResult, TaskStatus};
use crate::error::BlueprintError;
use crate::storage::{StorageError, StorageProvider};
use log::{debug, info};

/// Task name recorded for discovery runs.
pub const DISCOVERY_TASK: &str = "blueprints_discovery";

impl<S> BlueprintEngine<S>
where
    S: StorageProvider<Error = StorageError>,
{
    /// Scan the blueprint root and make sure every blueprint has an instance,
    /// scheduling an apply for each one whose content changed.
    ///
    /// With `path` set, only the blueprint at that relative path is
    /// reconciled.
    pub async fn discover(&self, tenant_id: &str, path: Option<&str>) -> TaskResult {
        let mut task = SystemTask::new(DISCOVERY_TASK);
        match self.reconcile(tenant_id, path).await {
            Ok(count) => task.set_status(
                TaskStatus::Successful,
                [format!("Successfully imported {} files.", count)],
            ),
            Err(error) => task.set_error(&error),
        }
        self.results().record(task).await
    }

    async fn reconcile(&self, tenant_id: &str, path: Option<&str>) -> Result<usize, BlueprintError> {
        let scanner = self.scanner().clone();
        let blueprints = tokio::task::spawn_blocking(move || scanner.find())
            .await
            .map_err(|error| BlueprintError::Io(std::io::Error::other(error)))??;

        let mut count = 0;
        for blueprint in blueprints {
            if path.is_some_and(|path| path != blueprint.path) {
                continue;
            }
            self.check_blueprint_file(tenant_id, &blueprint).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Reconcile one scanned file. Returns whether an apply was scheduled.
    pub async fn check_blueprint_file(
        &self,
        tenant_id: &str,
        blueprint: &BlueprintFile,
    ) -> Result<bool, BlueprintError> {
        if blueprint
            .meta
            .as_ref()
            .is_some_and(|meta| meta.instantiate_disabled())
        {
            debug!("Blueprint {} opts out of instantiation", blueprint.path);
            return Ok(false);
        }

        let instance = match self.store().find_by_path(tenant_id, &blueprint.path).await? {
            Some(instance) => instance,
            None => {
                let name = blueprint
                    .meta
                    .as_ref()
                    .map(|meta| meta.name.clone())
                    .unwrap_or_else(|| blueprint.path.clone());
                let instance = BlueprintInstance::new(name, blueprint.path.clone());
                self.store().save(tenant_id, &instance).await?;
                info!(
                    "Creating blueprint instance {} for {} in tenant {}",
                    instance.name, blueprint.path, tenant_id
                );
                instance
            }
        };

        if instance.is_applied(&blueprint.hash) {
            return Ok(false);
        }

        info!(
            "Applying blueprint {} due to changed file (tenant {})",
            instance.name, tenant_id
        );
        self.dispatcher().schedule(BlueprintTask::Apply {
            tenant: tenant_id.to_string(),
            instance_id: instance.instance_uuid,
        });
        Ok(true)
    }
}
