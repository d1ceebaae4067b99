//! Background task plumbing for blueprint work.
//!
//! Every task run is tracked by a [`SystemTask`] that carries its status and
//! messages and is recorded in a [`TaskResultLog`] when the run ends. Tasks
//! are scheduled through a [`TaskDispatcher`]; the engine itself never runs
//! scheduled work inline.

pub mod apply;
pub mod cleanup;
pub mod discovery;
pub mod dispatch;

pub use dispatch::{BlueprintTask, BlueprintWorker, ChannelDispatcher, TaskDispatcher};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of a task run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Successful,
    Warning,
    Error,
    #[default]
    Unknown,
}

/// Status tracker for one task run.
#[derive(Debug, Clone)]
pub struct SystemTask {
    name: &'static str,
    uid: Option<String>,
    status: TaskStatus,
    messages: Vec<String>,
    save_on_success: bool,
    started: DateTime<Utc>,
}

impl SystemTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            uid: None,
            status: TaskStatus::Unknown,
            messages: Vec::new(),
            save_on_success: true,
            started: Utc::now(),
        }
    }

    /// Do not keep a result record when the run succeeds.
    pub fn without_save_on_success(mut self) -> Self {
        self.save_on_success = false;
        self
    }

    /// Set the per-target identifier shown next to the task name.
    pub fn set_uid(&mut self, uid: impl Into<String>) {
        self.uid = Some(uid.into());
    }

    pub fn set_status<I, M>(&mut self, status: TaskStatus, messages: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        self.status = status;
        self.messages = messages.into_iter().map(Into::into).collect();
    }

    /// Mark the run as failed with the error as its only message.
    pub fn set_error(&mut self, error: &dyn std::error::Error) {
        self.status = TaskStatus::Error;
        self.messages = vec![error.to_string()];
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn finish(self) -> TaskResult {
        TaskResult {
            name: self.name.to_string(),
            uid: self.uid,
            status: self.status,
            messages: self.messages,
            started: self.started,
            finished: Utc::now(),
            save_on_success: self.save_on_success,
        }
    }
}

/// Final record of a task run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub name: String,
    pub uid: Option<String>,
    pub status: TaskStatus,
    pub messages: Vec<String>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    #[serde(skip)]
    pub save_on_success: bool,
}

/// In-memory sink for task results.
///
/// Holds the latest result per task name and uid; a new run replaces the
/// previous record of the same task.
#[derive(Debug, Clone, Default)]
pub struct TaskResultLog {
    results: Arc<RwLock<Vec<TaskResult>>>,
}

impl TaskResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish `task` and keep its result unless it is a successful run that
    /// opted out of being saved. The result is returned either way.
    pub async fn record(&self, task: SystemTask) -> TaskResult {
        let result = task.finish();
        if result.status == TaskStatus::Successful && !result.save_on_success {
            log::trace!("Not saving successful run of {}", result.name);
        } else {
            let mut results = self.results.write().await;
            results.retain(|previous| !(previous.name == result.name && previous.uid == result.uid));
            results.push(result.clone());
        }
        result
    }

    pub async fn results(&self) -> Vec<TaskResult> {
        self.results.read().await.clone()
    }

    /// Most recent result for a task name and uid.
    pub async fn latest(&self, name: &str, uid: Option<&str>) -> Option<TaskResult> {
        self.results
            .read()
            .await
            .iter()
            .find(|result| result.name == name && result.uid.as_deref() == uid)
            .cloned()
    }
}

/// Lowercase, hyphen-separated form of `value` suitable as a task uid.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }

    slug
}
