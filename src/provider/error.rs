//! Error types for provider operations.

use thiserror::Error;

/// Fixed error taxonomy surfaced to the invocation engine.
///
/// Provider-specific failure codes are mapped into these four kinds before
/// they reach retry classification or the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderErrorKind {
    Auth,
    RateLimit,
    Quota,
    Generic,
}

/// Errors that can occur during a provider call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Credential rejected by the provider.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider rate limit hit.
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Provider-side budget or quota exhausted.
    #[error("Quota exhausted: {0}")]
    Quota(String),

    /// No platform credential configured for this provider.
    #[error("No platform key configured for provider '{0}'")]
    NoPlatformKey(String),

    /// Platform access to this provider is administratively disabled.
    #[error("Platform access disabled for provider '{0}'")]
    PlatformDisabled(String),

    /// Call exceeded its deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Any other upstream failure.
    #[error("Provider error: {0}")]
    Generic(String),
}

impl ProviderError {
    /// Collapse into the fixed four-kind taxonomy.
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Auth(_) | ProviderError::NoPlatformKey(_) => ProviderErrorKind::Auth,
            ProviderError::RateLimit(_) => ProviderErrorKind::RateLimit,
            ProviderError::Quota(_) | ProviderError::PlatformDisabled(_) => {
                ProviderErrorKind::Quota
            }
            ProviderError::Timeout(_) | ProviderError::Generic(_) => ProviderErrorKind::Generic,
        }
    }

    /// Whether the retry loop may attempt this call again.
    ///
    /// Auth failures, missing platform keys, disabled platform access, quota
    /// exhaustion, and rate limits abort the attempt chain immediately:
    /// retrying them spends quota without changing the outcome. Timeouts and
    /// generic upstream failures are retryable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ProviderError::Auth(_)
            | ProviderError::NoPlatformKey(_)
            | ProviderError::PlatformDisabled(_)
            | ProviderError::Quota(_)
            | ProviderError::RateLimit(_) => false,
            ProviderError::Timeout(_) | ProviderError::Generic(_) => true,
        }
    }
}

/// Map an upstream HTTP status into the fixed taxonomy.
pub fn map_upstream_status(status: u16, message: impl Into<String>) -> ProviderError {
    let message = message.into();
    match status {
        401 | 403 => ProviderError::Auth(message),
        402 => ProviderError::Quota(message),
        429 => ProviderError::RateLimit(message),
        _ => ProviderError::Generic(format!("upstream {status}: {message}")),
    }
}
