//! Declarative configuration blueprints.
//!
//! Blueprints are YAML documents below a root directory. The pieces fit
//! together as follows:
//!
//! - [`BlueprintScanner`] finds blueprint files and hashes their content.
//! - Discovery binds each file to a persisted [`BlueprintInstance`] and
//!   schedules an apply when the content changed since the last success.
//! - Apply retrieves the content, validates it with a dry run and imports its
//!   entries through the [`Importer`](importer::Importer).
//! - Cleanup deletes instances whose source is permanently gone.
//! - [`BlueprintWatcher`] turns filesystem events into discovery and apply
//!   tasks.

pub mod engine;
pub mod hashing;
pub mod importer;
pub mod instance;
pub mod metadata;
pub mod retrieval;
pub mod scanner;
pub mod store;
pub mod tasks;
pub mod watcher;

pub use engine::BlueprintEngine;
pub use instance::{BlueprintInstance, BlueprintInstanceStatus};
pub use metadata::{BlueprintMetadata, LABEL_INSTANTIATE};
pub use retrieval::{BlueprintRetriever, RemoteFetcher, RetrievalError, SourceRetriever};
pub use scanner::{BlueprintFile, BlueprintScanner};
pub use store::BlueprintInstanceStore;
pub use tasks::{
    BlueprintTask, BlueprintWorker, ChannelDispatcher, SystemTask, TaskDispatcher, TaskResult,
    TaskResultLog, TaskStatus,
};
pub use watcher::{BlueprintWatcher, WatcherError};

/// The only blueprint format version this crate understands.
pub const SUPPORTED_VERSION: u64 = 1;
