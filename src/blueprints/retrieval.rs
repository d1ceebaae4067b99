//! Blueprint content retrieval.
//!
//! Instances point either at a file below the blueprint root or at a remote
//! reference carrying the configured prefix. Remote fetching is delegated to
//! an injected [`RemoteFetcher`]; without one, remote instances report a
//! transient failure.

use crate::blueprints::instance::BlueprintInstance;
use crate::config::EngineConfig;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure to obtain blueprint content for an instance.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Blueprint file '{path}' does not exist")]
    NotFound { path: String },

    #[error("Blueprint path '{path}' is outside the blueprint root")]
    InvalidPath { path: String },

    #[error("Failed to read blueprint '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote blueprint '{reference}' unavailable: {message}")]
    Unavailable { reference: String, message: String },
}

impl RetrievalError {
    /// Whether the source can never be retrieved without operator action.
    ///
    /// Instances failing with a permanent error are removed by the cleanup
    /// task.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            RetrievalError::NotFound { .. } | RetrievalError::InvalidPath { .. }
        )
    }
}

/// Produces the raw content of an instance's blueprint.
#[async_trait]
pub trait BlueprintRetriever: Send + Sync {
    async fn retrieve(&self, instance: &BlueprintInstance) -> Result<String, RetrievalError>;
}

/// Fetches remote blueprints, e.g. from an OCI registry.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch(&self, reference: &str) -> Result<String, RetrievalError>;
}

/// Retrieves inline, local and remote blueprints.
#[derive(Clone)]
pub struct SourceRetriever {
    root: PathBuf,
    remote_prefix: String,
    remote: Option<Arc<dyn RemoteFetcher>>,
}

impl SourceRetriever {
    pub fn new(root: impl Into<PathBuf>, remote_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            remote_prefix: remote_prefix.into(),
            remote: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.blueprints_dir.clone(), config.oci_prefix.clone())
    }

    pub fn with_remote(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.remote = Some(fetcher);
        self
    }

    async fn retrieve_local(&self, path: &str) -> Result<String, RetrievalError> {
        let not_found = || RetrievalError::NotFound {
            path: path.to_string(),
        };
        if path.is_empty() {
            return Err(not_found());
        }

        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|_| not_found())?;
        let full = match tokio::fs::canonicalize(self.root.join(path)).await {
            Ok(full) => full,
            Err(error) if error.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(source) => {
                return Err(RetrievalError::Io {
                    path: path.to_string(),
                    source,
                });
            }
        };

        if !full.starts_with(&root) {
            return Err(RetrievalError::InvalidPath {
                path: path.to_string(),
            });
        }
        if !full.is_file() {
            return Err(not_found());
        }

        tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| RetrievalError::Io {
                path: path.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for SourceRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRetriever")
            .field("root", &self.root)
            .field("remote_prefix", &self.remote_prefix)
            .field("remote", &self.remote.is_some())
            .finish()
    }
}

#[async_trait]
impl BlueprintRetriever for SourceRetriever {
    async fn retrieve(&self, instance: &BlueprintInstance) -> Result<String, RetrievalError> {
        if let Some(content) = &instance.content {
            return Ok(content.clone());
        }

        if instance.path.starts_with(&self.remote_prefix) {
            return match &self.remote {
                Some(fetcher) => fetcher.fetch(&instance.path).await,
                None => Err(RetrievalError::Unavailable {
                    reference: instance.path.clone(),
                    message: "no remote fetcher configured".to_string(),
                }),
            };
        }

        self.retrieve_local(&instance.path).await
    }
}
