//! Invocation Engine module.
//!
//! Wraps a single external model call with prompt dispatch, JSON extraction,
//! schema validation, and a bounded retry loop. The retry/abort decision is a
//! pure function of a tagged attempt outcome, never an exception hierarchy:
//! JSON and validation failures are retryable, provider errors consult the
//! fixed non-recoverable set, and the loop stops at the configured bound.

pub mod extract;
pub mod repair;
pub mod schemas;

pub use extract::extract_json_payload;
pub use repair::repair_truncated_json;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::provider::{Completion, Invocation, ProviderError, ProviderRegistry, TokenUsage};
use crate::routing::ResolvedRoute;

/// Per-call generation options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Total attempts allowed, including the first.
    pub max_retries: u32,
    /// Run truncation repair before declaring a payload unparseable. Enabled
    /// for the two-stage detailed-scoring flow, whose outputs are long enough
    /// to hit provider token caps.
    pub repair_truncation: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            repair_truncation: false,
        }
    }
}

/// What a single attempt produced, when it did not produce a value.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Response text did not contain parseable JSON.
    #[error("Response is not valid JSON: {0}")]
    Json(String),

    /// JSON parsed but did not match the expected schema.
    #[error("Response failed schema validation: {0}")]
    Schema(String),

    /// Schema matched but a cross-field invariant did not hold.
    #[error("Output invariant violated: {0}")]
    Invariant(String),
}

impl GenerationError {
    /// Retry decision as a pure function of the tag.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Provider(e) => e.is_recoverable(),
            GenerationError::Json(_)
            | GenerationError::Schema(_)
            | GenerationError::Invariant(_) => true,
        }
    }

    /// JSON-shaped failures (as opposed to hard provider errors) are the ones
    /// eligible for the deterministic scoring fallback.
    pub fn is_json_shaped(&self) -> bool {
        matches!(
            self,
            GenerationError::Json(_) | GenerationError::Schema(_) | GenerationError::Invariant(_)
        )
    }
}

/// Terminal failure of a generation chain.
///
/// Exhaustion is tagged distinctly from a plain provider error so callers can
/// choose a different fallback path for each.
#[derive(Debug, Error)]
pub enum GenerateFailure {
    /// A non-recoverable provider error aborted the chain immediately.
    #[error(transparent)]
    Provider(ProviderError),

    /// The retry bound was reached; `last` is the final attempt's error.
    #[error("Generation failed after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: GenerationError },
}

impl GenerateFailure {
    pub fn is_json_shaped(&self) -> bool {
        match self {
            GenerateFailure::Provider(_) => false,
            GenerateFailure::Exhausted { last, .. } => last.is_json_shaped(),
        }
    }
}

/// A successful generation with its realized cost.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub value: T,
    /// Raw text of the winning attempt.
    pub raw: String,
    /// Realized cost across all attempts, including failed ones.
    pub cost_usd: f64,
    pub usage: TokenUsage,
    /// Attempts consumed, including the successful one.
    pub attempts: u32,
    /// Catalog id of the model that produced the winning attempt.
    pub model_id: String,
}

/// Structured-output generation over the provider registry.
pub struct InvocationEngine {
    providers: ProviderRegistry,
}

impl InvocationEngine {
    pub fn new(providers: ProviderRegistry) -> Self {
        Self { providers }
    }

    /// Run the bounded attempt loop for one structured output.
    ///
    /// The first attempt uses the route's primary model; later attempts use
    /// the retry model when the route carries one.
    ///
    /// # Errors
    ///
    /// - `GenerateFailure::Provider` when a non-recoverable provider error
    ///   aborts the chain
    /// - `GenerateFailure::Exhausted` when `max_retries` attempts are spent
    pub async fn generate<T, V>(
        &self,
        route: &ResolvedRoute,
        system_prompt: &str,
        user_prompt: &str,
        options: GenerateOptions,
        validate: V,
    ) -> Result<Generated<T>, GenerateFailure>
    where
        T: DeserializeOwned,
        V: Fn(&T) -> Result<(), String>,
    {
        let max_attempts = options.max_retries.max(1);
        let mut last: Option<GenerationError> = None;
        let mut cost_usd = 0.0;
        let mut usage = TokenUsage::default();

        for attempt in 1..=max_attempts {
            let model = if attempt == 1 {
                &route.model
            } else {
                route.retry_model.as_ref().unwrap_or(&route.model)
            };

            let provider = match self.providers.get(model.provider) {
                Some(provider) => provider,
                None => {
                    return Err(GenerateFailure::Provider(ProviderError::NoPlatformKey(
                        model.provider.to_string(),
                    )))
                }
            };

            let request = Invocation {
                model_key: model.model_key.clone(),
                system_prompt: system_prompt.to_string(),
                prompt: user_prompt.to_string(),
                params: route.params.clone(),
            };

            let completion: Completion = match provider.invoke(request).await {
                Ok(completion) => completion,
                Err(err) if err.is_recoverable() => {
                    tracing::warn!(
                        scenario = %route.scenario,
                        model = %model.id,
                        attempt,
                        error = %err,
                        "Provider attempt failed, may retry"
                    );
                    last = Some(GenerationError::Provider(err));
                    continue;
                }
                Err(err) => {
                    tracing::error!(
                        scenario = %route.scenario,
                        model = %model.id,
                        attempt,
                        error = %err,
                        "Non-recoverable provider error, aborting chain"
                    );
                    return Err(GenerateFailure::Provider(err));
                }
            };

            cost_usd += completion.cost_usd;
            usage.input_tokens += completion.usage.input_tokens;
            usage.output_tokens += completion.usage.output_tokens;
            usage.cached_input_tokens += completion.usage.cached_input_tokens;

            match parse_structured::<T, _>(&completion.text, options, &validate) {
                Ok(value) => {
                    tracing::debug!(
                        scenario = %route.scenario,
                        model = %model.id,
                        attempt,
                        cost_usd,
                        "Structured generation succeeded"
                    );
                    return Ok(Generated {
                        value,
                        raw: completion.text,
                        cost_usd,
                        usage,
                        attempts: attempt,
                        model_id: model.id.clone(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        scenario = %route.scenario,
                        model = %model.id,
                        attempt,
                        error = %err,
                        "Structured output rejected"
                    );
                    last = Some(err);
                }
            }
        }

        Err(GenerateFailure::Exhausted {
            attempts: max_attempts,
            last: last.unwrap_or_else(|| GenerationError::Json("empty attempt chain".to_string())),
        })
    }
}

/// Extract, parse, type, and validate one raw response.
fn parse_structured<T, V>(
    text: &str,
    options: GenerateOptions,
    validate: &V,
) -> Result<T, GenerationError>
where
    T: DeserializeOwned,
    V: Fn(&T) -> Result<(), String>,
{
    let payload = extract_json_payload(text);

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(parse_err) => {
            if options.repair_truncation {
                match repair_truncated_json(payload) {
                    Some(value) => {
                        tracing::warn!("Recovered truncated JSON payload by tail repair");
                        value
                    }
                    None => return Err(GenerationError::Json(parse_err.to_string())),
                }
            } else {
                return Err(GenerationError::Json(parse_err.to_string()));
            }
        }
    };

    let typed: T =
        serde_json::from_value(value).map_err(|e| GenerationError::Schema(e.to_string()))?;
    validate(&typed).map_err(GenerationError::Invariant)?;
    Ok(typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    fn no_validation(_: &Sample) -> Result<(), String> {
        Ok(())
    }

    #[test]
    fn test_parse_structured_fenced() {
        let text = "```json\n{\"value\": 7}\n```";
        let sample: Sample =
            parse_structured(text, GenerateOptions::default(), &no_validation).unwrap();
        assert_eq!(sample, Sample { value: 7 });
    }

    #[test]
    fn test_parse_structured_schema_mismatch() {
        let text = "{\"value\": \"not a number\"}";
        let err = parse_structured::<Sample, _>(text, GenerateOptions::default(), &no_validation)
            .unwrap_err();
        assert!(matches!(err, GenerationError::Schema(_)));
        assert!(err.is_retryable());
        assert!(err.is_json_shaped());
    }

    #[test]
    fn test_parse_structured_invariant_failure() {
        let reject = |_: &Sample| Err("always wrong".to_string());
        let err =
            parse_structured::<Sample, _>("{\"value\": 1}", GenerateOptions::default(), &reject)
                .unwrap_err();
        assert!(matches!(err, GenerationError::Invariant(_)));
        assert!(err.is_json_shaped());
    }

    #[test]
    fn test_parse_structured_repair_disabled_by_default() {
        let truncated = "{\"value\": 7, \"extra\": \"long tail of text that got cut";
        let err = parse_structured::<Sample, _>(
            truncated,
            GenerateOptions::default(),
            &no_validation,
        )
        .unwrap_err();
        assert!(matches!(err, GenerationError::Json(_)));
    }

    #[test]
    fn test_parse_structured_repair_enabled() {
        let truncated = "{\"value\": 7, \"extra\": \"long tail of text that got cut";
        let options = GenerateOptions {
            repair_truncation: true,
            ..Default::default()
        };
        let sample: Sample = parse_structured(truncated, options, &no_validation).unwrap();
        assert_eq!(sample.value, 7);
    }

    #[test]
    fn test_provider_error_tag_classification() {
        let retryable = GenerationError::Provider(ProviderError::Generic("503".into()));
        assert!(retryable.is_retryable());
        assert!(!retryable.is_json_shaped());

        let fatal = GenerationError::Provider(ProviderError::Auth("bad key".into()));
        assert!(!fatal.is_retryable());
    }
}
