//! Task scheduling.
//!
//! [`TaskDispatcher`] is the seam through which discovery and the watcher
//! hand work off. [`ChannelDispatcher`] queues tasks on an unbounded channel
//! and [`BlueprintWorker`] drains it, running each task on its own tokio task.

use crate::blueprints::engine::BlueprintEngine;
use crate::storage::{StorageError, StorageProvider};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Work items understood by the blueprint engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlueprintTask {
    /// Scan the blueprint root and reconcile instances, optionally limited to
    /// one relative path.
    Discovery {
        tenant: String,
        path: Option<String>,
    },
    /// Apply one instance.
    Apply { tenant: String, instance_id: Uuid },
    /// Remove instances whose source no longer exists.
    ClearFailed { tenant: String },
}

impl BlueprintTask {
    pub fn tenant(&self) -> &str {
        match self {
            BlueprintTask::Discovery { tenant, .. }
            | BlueprintTask::Apply { tenant, .. }
            | BlueprintTask::ClearFailed { tenant } => tenant,
        }
    }
}

/// Accepts tasks for asynchronous execution.
pub trait TaskDispatcher: Send + Sync {
    fn schedule(&self, task: BlueprintTask);
}

/// Dispatcher backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::UnboundedSender<BlueprintTask>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiver a [`BlueprintWorker`] drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BlueprintTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl TaskDispatcher for ChannelDispatcher {
    fn schedule(&self, task: BlueprintTask) {
        debug!("Scheduling {:?}", task);
        if let Err(error) = self.sender.send(task) {
            warn!("Dropping task, worker is gone: {:?}", error.0);
        }
    }
}

/// Runs tasks received from a [`ChannelDispatcher`].
pub struct BlueprintWorker<S> {
    engine: Arc<BlueprintEngine<S>>,
    receiver: mpsc::UnboundedReceiver<BlueprintTask>,
}

impl<S> BlueprintWorker<S>
where
    S: StorageProvider<Error = StorageError> + 'static,
{
    pub fn new(
        engine: Arc<BlueprintEngine<S>>,
        receiver: mpsc::UnboundedReceiver<BlueprintTask>,
    ) -> Self {
        Self { engine, receiver }
    }

    /// Run until the channel closes.
    pub async fn run(self) {
        self.run_until(std::future::pending()).await
    }

    /// Run until the channel closes or `shutdown` completes.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Blueprint worker shutting down");
                    break;
                }
                task = self.receiver.recv() => {
                    let Some(task) = task else { break };
                    let engine = Arc::clone(&self.engine);
                    tokio::spawn(async move {
                        engine.run_task(task).await;
                    });
                }
            }
        }
    }
}
