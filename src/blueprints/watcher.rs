//! Filesystem watcher for the blueprint root.
//!
//! The watcher subscribes recursively to the blueprint root. New files
//! trigger a full discovery in every active tenant; modified files trigger an
//! apply of every enabled instance bound to that path. The notify callback
//! only classifies events and hands the rest off to the tokio runtime.

use crate::blueprints::engine::BlueprintEngine;
use crate::blueprints::scanner::relative_blueprint_path;
use crate::multi_tenant::TenantResolver;
use crate::storage::{StorageError, StorageProvider};
use log::{debug, info, warn};
use notify::event::{CreateKind, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::runtime::Handle;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Cannot watch blueprint root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Filesystem watcher failed: {0}")]
    Notify(#[from] notify::Error),
}

/// Kind of change the watcher reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChange {
    Created,
    Modified,
}

/// Map a notify event kind to the change it represents, if any.
pub fn classify(kind: &EventKind) -> Option<FileChange> {
    match kind {
        EventKind::Create(CreateKind::Folder) => None,
        EventKind::Create(_) => Some(FileChange::Created),
        #[cfg(target_os = "linux")]
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileChange::Created),
        EventKind::Modify(_) => Some(FileChange::Modified),
        _ => None,
    }
}

/// Owns the single filesystem observer of the process.
///
/// [`BlueprintWatcher::start`] only ever succeeds once per watcher; share one
/// instance for the whole process.
#[derive(Default)]
pub struct BlueprintWatcher {
    started: AtomicBool,
    observer: Mutex<Option<RecommendedWatcher>>,
}

impl BlueprintWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Start watching the engine's blueprint root.
    ///
    /// Returns `Ok(false)` if the watcher was already started.
    pub fn start<S, T>(
        &self,
        engine: Arc<BlueprintEngine<S>>,
        tenants: Arc<T>,
        runtime: Handle,
    ) -> Result<bool, WatcherError>
    where
        S: StorageProvider<Error = StorageError> + 'static,
        T: TenantResolver + 'static,
    {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Blueprint watcher already running");
            return Ok(false);
        }

        match Self::observe(engine, tenants, runtime) {
            Ok(observer) => {
                let mut slot = self
                    .observer
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                *slot = Some(observer);
                Ok(true)
            }
            Err(error) => {
                self.started.store(false, Ordering::Release);
                Err(error)
            }
        }
    }

    fn observe<S, T>(
        engine: Arc<BlueprintEngine<S>>,
        tenants: Arc<T>,
        runtime: Handle,
    ) -> Result<RecommendedWatcher, WatcherError>
    where
        S: StorageProvider<Error = StorageError> + 'static,
        T: TenantResolver + 'static,
    {
        let configured = engine.config().blueprints_dir.clone();
        let root = std::fs::canonicalize(&configured).map_err(|source| WatcherError::Root {
            path: configured,
            source,
        })?;

        let handler = BlueprintEventHandler {
            root: root.clone(),
            engine,
            tenants,
            runtime,
        };
        let mut observer = notify::recommended_watcher(handler)?;
        observer.watch(&root, RecursiveMode::Recursive)?;
        info!("Watching blueprints in {}", root.display());
        Ok(observer)
    }
}

/// Receives notify events and hands work to the engine.
pub struct BlueprintEventHandler<S, T> {
    root: PathBuf,
    engine: Arc<BlueprintEngine<S>>,
    tenants: Arc<T>,
    runtime: Handle,
}

impl<S, T> BlueprintEventHandler<S, T>
where
    S: StorageProvider<Error = StorageError> + 'static,
    T: TenantResolver + 'static,
{
    fn on_created(&self) {
        let engine = Arc::clone(&self.engine);
        let tenants = Arc::clone(&self.tenants);
        self.runtime.spawn(async move {
            if let Err(error) = engine.schedule_discovery(tenants.as_ref()).await {
                warn!("Cannot list tenants for blueprint discovery: {}", error);
            }
        });
    }

    fn on_modified(&self, path: &Path) {
        let Some(relative) = relative_blueprint_path(&self.root, path) else {
            debug!("Ignoring change outside blueprint root: {}", path.display());
            return;
        };

        let engine = Arc::clone(&self.engine);
        let tenants = Arc::clone(&self.tenants);
        self.runtime.spawn(async move {
            if let Err(error) = engine
                .schedule_apply_for_path(tenants.as_ref(), &relative)
                .await
            {
                warn!("Cannot list tenants for blueprint {}: {}", relative, error);
            }
        });
    }
}

impl<S, T> notify::EventHandler for BlueprintEventHandler<S, T>
where
    S: StorageProvider<Error = StorageError> + 'static,
    T: TenantResolver + 'static,
{
    fn handle_event(&mut self, event: notify::Result<Event>) {
        let event = match event {
            Ok(event) => event,
            Err(error) => {
                warn!("Blueprint watcher error: {}", error);
                return;
            }
        };
        let Some(change) = classify(&event.kind) else {
            return;
        };

        let files: Vec<&PathBuf> = event.paths.iter().filter(|path| !path.is_dir()).collect();
        if files.is_empty() {
            return;
        }

        match change {
            FileChange::Created => self.on_created(),
            FileChange::Modified => {
                for path in files {
                    self.on_modified(path);
                }
            }
        }
    }
}
