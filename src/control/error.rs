//! Typed failure taxonomy exposed to callers.
//!
//! Callers receive a small, stable set of reasons, never raw provider text,
//! so UI layers can present consistent messaging and know which failures are
//! worth a manual retry.

use thiserror::Error;

use crate::budget::DenyReason;
use crate::invocation::{GenerateFailure, GenerationError};
use crate::provider::ProviderErrorKind;
use crate::routing::Scenario;
use crate::store::StoreError;

/// Terminal failure of a control-plane operation.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Scenario disabled or no usable assignment. Recoverable by the caller
    /// via feature hide/disable; never retried automatically.
    #[error("No usable route for scenario '{scenario}'")]
    RoutingUnavailable { scenario: Scenario },

    /// A required input field was absent or blank. Rejected before the gate
    /// runs, so nothing is spent on a half-formed request.
    #[error("Missing required input field '{field}'")]
    MissingInput { field: &'static str },

    /// Spend refused before any network cost was incurred.
    #[error("Spend denied: {0}")]
    BudgetDenied(DenyReason),

    /// Non-recoverable provider failure, collapsed to the fixed taxonomy.
    #[error("Provider failure: {kind:?}")]
    Provider { kind: ProviderErrorKind },

    /// Retry bound exhausted on JSON-parse or schema-validation failures.
    #[error("Output validation failed after {attempts} attempt(s): {detail}")]
    OutputValidation { attempts: u32, detail: String },

    /// Storage collaborator failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ControlError {
    pub(crate) fn from_generate(failure: GenerateFailure) -> Self {
        match failure {
            GenerateFailure::Provider(err) => ControlError::Provider { kind: err.kind() },
            GenerateFailure::Exhausted { attempts, last } => match last {
                GenerationError::Provider(err) => ControlError::Provider { kind: err.kind() },
                other => ControlError::OutputValidation {
                    attempts,
                    detail: other.to_string(),
                },
            },
        }
    }
}
