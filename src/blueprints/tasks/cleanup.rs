//! Cleanup: remove instances whose source is permanently gone.

use crate::blueprints::engine::BlueprintEngine;
use crate::blueprints::tasks::{SystemTask, TaskResult, TaskStatus};
use crate::error::BlueprintError;
use crate::storage::{StorageError, StorageProvider};
use log::info;

/// Task name recorded for cleanup runs.
pub const CLEAR_FAILED_TASK: &str = "clear_failed_blueprints";

impl<S> BlueprintEngine<S>
where
    S: StorageProvider<Error = StorageError>,
{
    /// Delete every local instance whose blueprint can no longer be
    /// retrieved. Remote instances are left alone; a transient failure aborts
    /// the sweep.
    pub async fn clear_failed(&self, tenant_id: &str) -> TaskResult {
        let mut task = SystemTask::new(CLEAR_FAILED_TASK);
        match self.sweep(tenant_id).await {
            Ok(removed) => task.set_status(
                TaskStatus::Successful,
                [format!("Removed {} blueprint instances.", removed)],
            ),
            Err(error) => task.set_error(&error),
        }
        self.results().record(task).await
    }

    /// Returns the number of deleted instances.
    pub async fn sweep(&self, tenant_id: &str) -> Result<usize, BlueprintError> {
        let mut removed = 0;
        for instance in self.store().list(tenant_id).await? {
            if self.config().is_remote_path(&instance.path) {
                continue;
            }
            match self.retriever().retrieve(&instance).await {
                Ok(_) => {}
                Err(error) if error.is_permanent() => {
                    info!(
                        "Removing blueprint instance {} in tenant {}: {}",
                        instance.name, tenant_id, error
                    );
                    self.store().delete(tenant_id, instance.instance_uuid).await?;
                    removed += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(removed)
    }
}
