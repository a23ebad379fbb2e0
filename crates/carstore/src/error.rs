use std::io;

use thiserror::Error;

/// Unified error type for store operations.
///
/// Low-level file errors bubble up from the `recfile` and `keyindex`
/// crates; `NotFound` and `Corrupt` are produced at the catalog layer
/// where the entity being handled is known.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Record(#[from] recfile::RecordError),
    #[error(transparent)]
    Index(#[from] keyindex::IndexError),
    #[error("{entity} `{key}` not found")]
    NotFound { entity: &'static str, key: String },
    #[error("corrupt {entity} record: {reason}")]
    Corrupt { entity: &'static str, reason: String },
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub(crate) fn corrupt(entity: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            entity,
            reason: reason.into(),
        }
    }

    /// Returns `true` for lookup misses, including duplicate-free
    /// index misses surfaced from the index layer.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound { .. } | StoreError::Index(keyindex::IndexError::NotFound(_))
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
