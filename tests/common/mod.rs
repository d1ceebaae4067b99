//! Common test utilities for the blueprint engine and identification stage.
//!
//! Provides a recording dispatcher, temporary blueprint roots, a storage
//! wrapper that can be made to fail, and engine constructors wired to them.

use idp_engine::blueprints::{BlueprintEngine, BlueprintTask, TaskDispatcher};
use idp_engine::config::EngineConfig;
use idp_engine::storage::{
    InMemoryStorage, MatchMode, StorageError, StorageKey, StoragePrefix, StorageProvider,
};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use uuid::Uuid;

pub mod fixtures;

/// Dispatcher that only records what was scheduled.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    tasks: Mutex<Vec<BlueprintTask>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn tasks(&self) -> Vec<BlueprintTask> {
        self.tasks.lock().unwrap().clone()
    }

    /// Instance ids of all scheduled applies, in scheduling order.
    pub fn applies(&self) -> Vec<Uuid> {
        self.tasks()
            .into_iter()
            .filter_map(|task| match task {
                BlueprintTask::Apply { instance_id, .. } => Some(instance_id),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.tasks.lock().unwrap().clear();
    }
}

impl TaskDispatcher for RecordingDispatcher {
    fn schedule(&self, task: BlueprintTask) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// A temporary blueprint root directory.
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create blueprint dir");
        }
        fs::write(path, content).expect("Failed to write blueprint");
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).expect("Failed to remove blueprint");
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::builder()
            .blueprints_dir(self.path())
            .watch(false)
            .build()
            .expect("Invalid test config")
    }
}

/// Route engine logs to the test output; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Engine over fresh in-memory storage that records scheduled tasks.
pub fn engine(root: &TestRoot, dispatcher: Arc<RecordingDispatcher>) -> BlueprintEngine<InMemoryStorage> {
    init_logging();
    BlueprintEngine::new(root.config(), InMemoryStorage::new(), dispatcher)
}

/// In-memory storage whose writes can be switched to fail.
#[derive(Clone, Default)]
pub struct FlakyStorage {
    inner: InMemoryStorage,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("writes disabled"))
        } else {
            Ok(())
        }
    }
}

impl StorageProvider for FlakyStorage {
    type Error = StorageError;

    async fn put(&self, key: StorageKey, data: Value) -> Result<Value, Self::Error> {
        self.check_write()?;
        self.inner.put(key, data).await
    }

    async fn get(&self, key: StorageKey) -> Result<Option<Value>, Self::Error> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, Self::Error> {
        self.check_write()?;
        self.inner.delete(key).await
    }

    async fn list(
        &self,
        prefix: StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(StorageKey, Value)>, Self::Error> {
        self.inner.list(prefix, offset, limit).await
    }

    async fn find_by_attribute(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &str,
        mode: MatchMode,
    ) -> Result<Vec<(StorageKey, Value)>, Self::Error> {
        self.inner.find_by_attribute(prefix, attribute, value, mode).await
    }

    async fn exists(&self, key: StorageKey) -> Result<bool, Self::Error> {
        self.inner.exists(key).await
    }

    async fn count(&self, prefix: StoragePrefix) -> Result<usize, Self::Error> {
        self.inner.count(prefix).await
    }

    async fn list_tenants(&self) -> Result<Vec<String>, Self::Error> {
        self.inner.list_tenants().await
    }
}

/// Poll `check` until it returns true or about five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    false
}
