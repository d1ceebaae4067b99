//! The blueprint engine.
//!
//! [`BlueprintEngine`] owns the collaborators every blueprint task needs and
//! exposes the tasks themselves (discovery, apply, cleanup) as methods. It is
//! shared behind an `Arc` between the worker and the filesystem watcher.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use idp_engine::blueprints::{BlueprintEngine, BlueprintWorker, ChannelDispatcher};
//! use idp_engine::config::EngineConfig;
//! use idp_engine::storage::InMemoryStorage;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (dispatcher, receiver) = ChannelDispatcher::new();
//! let engine = Arc::new(BlueprintEngine::new(
//!     EngineConfig::from_env()?,
//!     InMemoryStorage::new(),
//!     Arc::new(dispatcher),
//! ));
//!
//! tokio::spawn(BlueprintWorker::new(Arc::clone(&engine), receiver).run());
//! engine.discover("default", None).await;
//! # Ok(())
//! # }
//! ```

use crate::blueprints::importer::ModelRegistry;
use crate::blueprints::retrieval::{BlueprintRetriever, SourceRetriever};
use crate::blueprints::scanner::BlueprintScanner;
use crate::blueprints::store::BlueprintInstanceStore;
use crate::blueprints::tasks::{BlueprintTask, TaskDispatcher, TaskResult, TaskResultLog};
use crate::config::EngineConfig;
use crate::multi_tenant::TenantResolver;
use crate::storage::{StorageError, StorageProvider};
use log::{debug, warn};
use std::sync::Arc;

/// Runs blueprint discovery, apply and cleanup for any tenant.
pub struct BlueprintEngine<S> {
    config: EngineConfig,
    scanner: BlueprintScanner,
    store: BlueprintInstanceStore<S>,
    models: ModelRegistry,
    retriever: Arc<dyn BlueprintRetriever>,
    dispatcher: Arc<dyn TaskDispatcher>,
    results: TaskResultLog,
}

impl<S> BlueprintEngine<S>
where
    S: StorageProvider<Error = StorageError>,
{
    /// Create an engine reading blueprints from `config.blueprints_dir`.
    pub fn new(config: EngineConfig, storage: S, dispatcher: Arc<dyn TaskDispatcher>) -> Self {
        Self {
            scanner: BlueprintScanner::new(config.blueprints_dir.clone()),
            retriever: Arc::new(SourceRetriever::from_config(&config)),
            store: BlueprintInstanceStore::new(storage),
            models: ModelRegistry::default(),
            results: TaskResultLog::new(),
            config,
            dispatcher,
        }
    }

    /// Replace the default file/inline retriever.
    pub fn with_retriever(mut self, retriever: Arc<dyn BlueprintRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_models(mut self, models: ModelRegistry) -> Self {
        self.models = models;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scanner(&self) -> &BlueprintScanner {
        &self.scanner
    }

    pub fn store(&self) -> &BlueprintInstanceStore<S> {
        &self.store
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn retriever(&self) -> &dyn BlueprintRetriever {
        self.retriever.as_ref()
    }

    pub fn dispatcher(&self) -> &dyn TaskDispatcher {
        self.dispatcher.as_ref()
    }

    pub fn results(&self) -> &TaskResultLog {
        &self.results
    }

    /// Run one scheduled task to completion.
    pub async fn run_task(&self, task: BlueprintTask) -> TaskResult {
        debug!("Running {:?}", task);
        match task {
            BlueprintTask::Discovery { tenant, path } => {
                self.discover(&tenant, path.as_deref()).await
            }
            BlueprintTask::Apply {
                tenant,
                instance_id,
            } => self.apply(&tenant, instance_id).await,
            BlueprintTask::ClearFailed { tenant } => self.clear_failed(&tenant).await,
        }
    }

    /// Schedule a full discovery in every active tenant.
    pub async fn schedule_discovery<T>(&self, tenants: &T) -> Result<usize, T::Error>
    where
        T: TenantResolver,
    {
        let active = tenants.active_tenants().await?;
        for tenant in &active {
            self.dispatcher.schedule(BlueprintTask::Discovery {
                tenant: tenant.tenant_id.clone(),
                path: None,
            });
        }
        Ok(active.len())
    }

    /// Schedule a stale-blueprint cleanup in every active tenant.
    pub async fn schedule_clear_failed<T>(&self, tenants: &T) -> Result<usize, T::Error>
    where
        T: TenantResolver,
    {
        let active = tenants.active_tenants().await?;
        for tenant in &active {
            self.dispatcher.schedule(BlueprintTask::ClearFailed {
                tenant: tenant.tenant_id.clone(),
            });
        }
        Ok(active.len())
    }

    /// Schedule an apply for every enabled instance bound to `path`, in every
    /// active tenant. Tenants whose store cannot be read are skipped.
    pub async fn schedule_apply_for_path<T>(&self, tenants: &T, path: &str) -> Result<usize, T::Error>
    where
        T: TenantResolver,
    {
        let mut scheduled = 0;
        for tenant in tenants.active_tenants().await? {
            let instances = match self.store.enabled_by_path(&tenant.tenant_id, path).await {
                Ok(instances) => instances,
                Err(error) => {
                    warn!(
                        "Cannot look up instances for {} in tenant {}: {}",
                        path, tenant.tenant_id, error
                    );
                    continue;
                }
            };
            for instance in instances {
                debug!("Blueprint {} changed, applying {}", path, instance.name);
                self.dispatcher.schedule(BlueprintTask::Apply {
                    tenant: tenant.tenant_id.clone(),
                    instance_id: instance.instance_uuid,
                });
                scheduled += 1;
            }
        }
        Ok(scheduled)
    }
}
