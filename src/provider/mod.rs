//! Model-provider abstraction layer.
//!
//! This module provides the [`ModelProvider`] trait and supporting types that
//! abstract outbound model transports. The control plane sees one capability,
//! `invoke(model, system prompt, prompt, sampling params) -> (text, usage,
//! cost)`, uniform across providers; transport-specific error codes are
//! mapped into the fixed taxonomy before reaching the invocation engine.

pub mod error;

pub use error::{map_upstream_status, ProviderError, ProviderErrorKind};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::catalog::ModelPricing;
use crate::routing::SamplingParams;

/// Provider families the platform can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible API.
    OpenAi,
    /// Anthropic Claude API.
    Anthropic,
    /// Google Gemini API.
    Google,
    /// Any other OpenAI-compatible transport.
    Generic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Generic => "generic",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single outbound model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Provider-side model key (from the catalog descriptor).
    pub model_key: String,
    pub system_prompt: String,
    pub prompt: String,
    pub params: SamplingParams,
}

/// Realized token usage reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cached_input_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens + self.cached_input_tokens
    }
}

/// Raw completion returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Raw response text; may wrap JSON in a fenced code block.
    pub text: String,
    pub usage: TokenUsage,
    /// Realized cost in USD for this call.
    pub cost_usd: f64,
}

/// Unified interface for outbound model transports.
///
/// Object-safe; used as `Arc<dyn ModelProvider>` out of a fixed registry
/// built at startup. Implementations own HTTP details, credential handling,
/// and error mapping into [`ProviderError`].
#[async_trait]
pub trait ModelProvider: Send + Sync + 'static {
    /// Provider family served by this implementation.
    fn kind(&self) -> ProviderKind;

    /// Model key used when a route carries no explicit model.
    fn default_model(&self) -> &str;

    /// Pricing for a model key, for cost estimation before a call.
    fn cost_model(&self, model_key: &str) -> ModelPricing;

    /// Check that a credential is accepted by the provider.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Auth` for a rejected key; transport failures
    /// map to the usual taxonomy.
    async fn validate_key(&self, api_key: &str) -> Result<(), ProviderError>;

    /// Execute a single completion call.
    ///
    /// # Errors
    ///
    /// - `ProviderError::Auth` on credential rejection
    /// - `ProviderError::RateLimit` / `Quota` on provider-side limits
    /// - `ProviderError::Timeout` when the deadline is exceeded
    /// - `ProviderError::Generic` for any other upstream failure
    async fn invoke(&self, request: Invocation) -> Result<Completion, ProviderError>;
}

/// Fixed map of providers built at startup.
///
/// Providers are registered once during wiring, never discovered dynamically.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any previous one of the same kind.
    pub fn with_provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<ProviderKind> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_mapping() {
        assert_eq!(map_upstream_status(401, "bad key").kind(), ProviderErrorKind::Auth);
        assert_eq!(map_upstream_status(403, "forbidden").kind(), ProviderErrorKind::Auth);
        assert_eq!(
            map_upstream_status(429, "slow down").kind(),
            ProviderErrorKind::RateLimit
        );
        assert_eq!(map_upstream_status(402, "pay up").kind(), ProviderErrorKind::Quota);
        assert_eq!(map_upstream_status(500, "boom").kind(), ProviderErrorKind::Generic);
        assert_eq!(map_upstream_status(503, "busy").kind(), ProviderErrorKind::Generic);
    }

    #[test]
    fn test_recoverability_classification() {
        assert!(!ProviderError::Auth("x".into()).is_recoverable());
        assert!(!ProviderError::RateLimit("x".into()).is_recoverable());
        assert!(!ProviderError::Quota("x".into()).is_recoverable());
        assert!(!ProviderError::NoPlatformKey("openai".into()).is_recoverable());
        assert!(!ProviderError::PlatformDisabled("openai".into()).is_recoverable());
        assert!(ProviderError::Timeout(30_000).is_recoverable());
        assert!(ProviderError::Generic("x".into()).is_recoverable());
    }

    #[test]
    fn test_provider_kind_roundtrip() {
        let json = serde_json::to_string(&ProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let kind: ProviderKind = serde_json::from_str("\"anthropic\"").unwrap();
        assert_eq!(kind, ProviderKind::Anthropic);
    }
}
