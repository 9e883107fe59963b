//! Error types for catalog administration.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during catalog writes.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A model with this id is already registered.
    #[error("Model '{0}' already exists")]
    DuplicateModel(String),

    /// No model with this id exists.
    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    /// The model is referenced by routing assignments and cannot be deleted.
    #[error("Model '{model}' is referenced by {count} routing assignment(s)")]
    ModelReferenced { model: String, count: usize },

    /// Storage collaborator failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
