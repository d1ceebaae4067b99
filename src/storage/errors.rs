//! Storage-specific error types.
//!
//! These errors describe persistence failures only. They carry no knowledge of
//! blueprints or authentication flows; the layers above decide whether a
//! storage failure is fatal for their operation.

use std::fmt;

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested record was not found.
    RecordNotFound {
        tenant_id: String,
        kind: String,
        id: String,
    },

    /// Data could not be stored because of its shape.
    InvalidData {
        message: String,
        cause: Option<String>,
    },

    /// Invalid lookup parameters.
    InvalidQuery {
        message: String,
        attribute: Option<String>,
    },

    /// Storage backend is temporarily unavailable.
    Unavailable {
        message: String,
        retry_after: Option<std::time::Duration>,
    },

    /// Timeout occurred during a storage operation.
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// A stored record could not be encoded or decoded.
    Serialization {
        message: String,
        kind: Option<String>,
    },

    /// Generic internal storage error.
    Internal {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::RecordNotFound {
                tenant_id,
                kind,
                id,
            } => write!(f, "Record not found: {}/{}/{}", tenant_id, kind, id),
            StorageError::InvalidData { message, cause } => {
                if let Some(cause) = cause {
                    write!(f, "Invalid data: {} (cause: {})", message, cause)
                } else {
                    write!(f, "Invalid data: {}", message)
                }
            }
            StorageError::InvalidQuery { message, attribute } => match attribute {
                Some(attr) => write!(f, "Invalid query: {} (attribute: {})", message, attr),
                None => write!(f, "Invalid query: {}", message),
            },
            StorageError::Unavailable {
                message,
                retry_after,
            } => {
                if let Some(duration) = retry_after {
                    write!(
                        f,
                        "Storage unavailable: {} (retry after {:?})",
                        message, duration
                    )
                } else {
                    write!(f, "Storage unavailable: {}", message)
                }
            }
            StorageError::Timeout {
                operation,
                duration,
            } => write!(f, "Timeout during {} after {:?}", operation, duration),
            StorageError::Serialization { message, kind } => match kind {
                Some(kind) => write!(f, "Serialization error: {} (kind: {})", message, kind),
                None => write!(f, "Serialization error: {}", message),
            },
            StorageError::Internal { message, .. } => {
                write!(f, "Internal storage error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Internal { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl StorageError {
    /// Create a new RecordNotFound error.
    pub fn record_not_found(
        tenant_id: impl Into<String>,
        kind: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::RecordNotFound {
            tenant_id: tenant_id.into(),
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a new InvalidData error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a new InvalidData error with a cause.
    pub fn invalid_data_with_cause(message: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Create a new InvalidQuery error for a specific attribute.
    pub fn invalid_query(message: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
            attribute: Some(attribute.into()),
        }
    }

    /// Create a new Unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            retry_after: None,
        }
    }

    /// Create a new Timeout error.
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new Serialization error for a record kind.
    pub fn serialization(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a new Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::RecordNotFound { .. })
    }

    /// Check if this error indicates a temporary failure that might succeed on retry.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self,
            StorageError::Unavailable { .. } | StorageError::Timeout { .. }
        )
    }
}
