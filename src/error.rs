//! Error types for blueprint operations.
//!
//! [`BlueprintError`] is the set of failure classes the blueprint tasks
//! recognize at their boundary. Anything that converts into it is caught there,
//! recorded on the instance and reported through the task outcome instead of
//! propagating further.

use crate::blueprints::importer::EntryInvalidError;
use crate::blueprints::retrieval::RetrievalError;
use crate::storage::StorageError;

/// Recognized failure classes of the blueprint pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// Filesystem failures while scanning or reading blueprints
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persistence-layer failures
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Blueprint content could not be retrieved
    #[error("Blueprint retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// A blueprint entry is semantically invalid
    #[error("{0}")]
    EntryInvalid(#[from] EntryInvalidError),

    /// Blueprint content is not a valid document
    #[error("Failed to parse blueprint: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The `metadata` block of a scanned blueprint could not be decoded
    #[error("Invalid metadata in blueprint '{path}': {source}")]
    Metadata {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Converting resolved blueprint content into its typed form failed
    #[error("Failed to decode blueprint: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result type for blueprint operations.
pub type BlueprintResult<T> = Result<T, BlueprintError>;

impl BlueprintError {
    /// Whether this error came from the persistence layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, BlueprintError::Storage(_))
    }
}
