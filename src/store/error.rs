//! Error types for storage operations.

use thiserror::Error;

/// Errors that can occur when talking to the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store unreachable or returned a transport-level failure.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Write conflicted with existing state (duplicate key, stale upsert).
    #[error("Storage conflict: {0}")]
    Conflict(String),
}
