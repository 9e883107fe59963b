//! Error types for routing administration.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur on routing writes.
///
/// Resolution itself has no error type: the absence of a usable route is a
/// normal outcome, not an exception.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The referenced model does not exist in the catalog.
    #[error("Model '{0}' not found in catalog")]
    UnknownModel(String),

    /// The referenced model exists but is not active.
    #[error("Model '{0}' is not active")]
    InactiveModel(String),

    /// Storage collaborator failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
