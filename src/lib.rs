//! Identity provider engine library for Rust.
//!
//! Keeps declarative configuration blueprints reconciled with persisted state
//! and provides the identification stage of login flows.
//!
//! # Core Components
//!
//! - [`BlueprintEngine`] - Discovery, apply and cleanup of blueprint instances
//! - [`BlueprintWatcher`] - Turns filesystem changes into blueprint tasks
//! - [`IdentificationStageView`] - Resolves login identifiers to users
//! - [`StorageProvider`] - Trait for implementing storage backends
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use idp_engine::{BlueprintEngine, BlueprintWorker, ChannelDispatcher, EngineConfig};
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
//! tokio::spawn(BlueprintWorker::new(Arc::clone(&engine), receiver).run());
//!
//! let result = engine.discover("default", None).await;
//! println!("{:?}: {:?}", result.status, result.messages);
//! # Ok(())
//! # }
//! ```

pub mod blueprints;
pub mod config;
pub mod error;
pub mod flows;
pub mod multi_tenant;
pub mod sources;
pub mod stages;
pub mod storage;
pub mod users;

// Re-export commonly used types for convenience
pub use blueprints::{
    BlueprintEngine, BlueprintInstance, BlueprintInstanceStatus, BlueprintScanner, BlueprintTask,
    BlueprintWatcher, BlueprintWorker, ChannelDispatcher, TaskDispatcher, TaskStatus,
};
pub use config::{ConfigurationError, EngineConfig};
pub use error::{BlueprintError, BlueprintResult};
pub use stages::identification::{IdentificationStage, IdentificationStageView};
pub use stages::StageError;
pub use storage::{InMemoryStorage, StorageProvider};

// Multi-tenant types
pub use multi_tenant::{StaticTenantResolver, TenantContext, TenantResolver};
