//! Control plane facade.
//!
//! One logical flow per inbound request: consult the Budget Gate first (a
//! cheap local/store check), resolve the route, then run the bounded
//! generation loop. Routing unavailability and budget refusals short-circuit
//! before any network cost. The detailed-scoring flow chains two generations
//! (signal extraction, then evidence mapping) and degrades to the
//! deterministic keyword scorer when either stage exhausts retries on a
//! JSON-shaped failure; a best-effort score beats a hard failure there.

mod error;
pub mod prompts;

pub use error::ControlError;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::budget::{BudgetGate, FundSource, SpendAuthorization, UserContext};
use crate::invocation::schemas::{
    CoverLetter, EvidenceMapping, ParsedResume, SignalExtraction, TailoredResume,
};
use crate::invocation::{GenerateOptions, Generated, InvocationEngine};
use crate::provider::ProviderRegistry;
use crate::routing::{ResolvedRoute, Resolver, Scenario};
use crate::scoring::{self, EvidenceItem, GateFlags, MatchScore};
use crate::store::{ControlStore, StoreError};

/// Input to [`ControlPlane::run_scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub base_resume: Option<String>,
    #[serde(default)]
    pub tailored_resume: Option<String>,
    #[serde(default)]
    pub vacancy_text: Option<String>,
}

/// Output of [`ControlPlane::run_scenario`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ScenarioOutput {
    Parsed(ParsedResume),
    Tailored(TailoredResume),
    CoverLetter(CoverLetter),
    Score(MatchScore),
}

/// The assembled control plane.
pub struct ControlPlane {
    resolver: Resolver,
    gate: BudgetGate,
    engine: InvocationEngine,
    options: GenerateOptions,
}

impl ControlPlane {
    /// Wire the plane over one backing store and a fixed provider registry.
    pub fn new<S>(store: Arc<S>, providers: ProviderRegistry, options: GenerateOptions) -> Self
    where
        S: ControlStore + 'static,
    {
        let catalog_store: Arc<dyn crate::store::CatalogStore> = store.clone();
        let routing_store: Arc<dyn crate::store::RoutingStore> = store.clone();
        let budget_store: Arc<dyn crate::store::BudgetStore> = store.clone();
        let usage_log: Arc<dyn crate::store::UsageLog> = store;
        Self {
            resolver: Resolver::new(catalog_store, routing_store),
            gate: BudgetGate::new(budget_store, usage_log),
            engine: InvocationEngine::new(providers),
            options,
        }
    }

    /// Pure-read route resolution.
    pub async fn resolve_route(
        &self,
        role: &str,
        scenario: Scenario,
    ) -> Result<Option<ResolvedRoute>, StoreError> {
        self.resolver.resolve(role, scenario).await
    }

    /// Budget check without side effects.
    pub async fn authorize_spend(
        &self,
        user: &UserContext,
        funds: FundSource,
    ) -> Result<SpendAuthorization, StoreError> {
        self.gate.authorize(user, funds).await
    }

    /// Gate then resolve; the order matters: a denied request must stop
    /// before the resolver or any network call runs.
    async fn prepare(
        &self,
        user: &UserContext,
        scenario: Scenario,
        funds: FundSource,
    ) -> Result<ResolvedRoute, ControlError> {
        match self.gate.authorize(user, funds).await? {
            SpendAuthorization::Denied(reason) => return Err(ControlError::BudgetDenied(reason)),
            SpendAuthorization::Allowed(_) => {}
        }
        self.resolver
            .resolve(&user.role, scenario)
            .await?
            .ok_or(ControlError::RoutingUnavailable { scenario })
    }

    async fn settle<T>(
        &self,
        user: &UserContext,
        scenario: Scenario,
        funds: FundSource,
        generated: &Generated<T>,
    ) -> Result<(), ControlError> {
        self.gate
            .post_usage(user, scenario.as_str(), funds, generated.cost_usd)
            .await?;
        Ok(())
    }

    /// Run the resume-parse scenario.
    pub async fn parse_resume(
        &self,
        user: &UserContext,
        funds: FundSource,
        resume_text: &str,
    ) -> Result<ParsedResume, ControlError> {
        let route = self.prepare(user, Scenario::ResumeParse, funds).await?;
        let generated = self
            .engine
            .generate::<ParsedResume, _>(
                &route,
                prompts::PARSE_SYSTEM,
                &prompts::parse_prompt(resume_text),
                self.options,
                |out| out.validate(),
            )
            .await
            .map_err(ControlError::from_generate)?;
        self.settle(user, Scenario::ResumeParse, funds, &generated)
            .await?;
        Ok(generated.value)
    }

    /// Run the resume-tailor scenario.
    pub async fn tailor_resume(
        &self,
        user: &UserContext,
        funds: FundSource,
        base_resume: &str,
        vacancy_text: &str,
    ) -> Result<TailoredResume, ControlError> {
        let route = self.prepare(user, Scenario::ResumeTailor, funds).await?;
        let generated = self
            .engine
            .generate::<TailoredResume, _>(
                &route,
                prompts::TAILOR_SYSTEM,
                &prompts::tailor_prompt(base_resume, vacancy_text),
                self.options,
                |out| out.validate(),
            )
            .await
            .map_err(ControlError::from_generate)?;
        self.settle(user, Scenario::ResumeTailor, funds, &generated)
            .await?;
        Ok(generated.value)
    }

    /// Run the cover-letter scenario.
    pub async fn cover_letter(
        &self,
        user: &UserContext,
        funds: FundSource,
        base_resume: &str,
        vacancy_text: &str,
    ) -> Result<CoverLetter, ControlError> {
        let route = self.prepare(user, Scenario::CoverLetter, funds).await?;
        let generated = self
            .engine
            .generate::<CoverLetter, _>(
                &route,
                prompts::COVER_LETTER_SYSTEM,
                &prompts::cover_letter_prompt(base_resume, vacancy_text),
                self.options,
                |out| out.validate(),
            )
            .await
            .map_err(ControlError::from_generate)?;
        self.settle(user, Scenario::CoverLetter, funds, &generated)
            .await?;
        Ok(generated.value)
    }

    /// Run the two-stage detailed-scoring scenario.
    ///
    /// Stage one extracts weighted signals from the vacancy; stage two maps
    /// evidence against both resumes. JSON-shaped exhaustion of either stage
    /// falls back to the deterministic keyword scorer instead of surfacing an
    /// error; hard provider errors and budget/routing refusals still do.
    pub async fn detailed_score(
        &self,
        user: &UserContext,
        funds: FundSource,
        base_resume: &str,
        tailored_resume: &str,
        vacancy_text: &str,
    ) -> Result<MatchScore, ControlError> {
        let route = self.prepare(user, Scenario::DetailedScoring, funds).await?;
        let options = GenerateOptions {
            repair_truncation: true,
            ..self.options
        };

        let signals = match self
            .engine
            .generate::<SignalExtraction, _>(
                &route,
                prompts::SIGNAL_EXTRACTION_SYSTEM,
                &prompts::signal_extraction_prompt(vacancy_text),
                options,
                |out| out.validate(),
            )
            .await
        {
            Ok(generated) => {
                self.settle(user, Scenario::DetailedScoring, funds, &generated)
                    .await?;
                tracing::debug!(
                    signals = generated.value.signal_count(),
                    "Signal extraction succeeded"
                );
                generated.value
            }
            Err(failure) if failure.is_json_shaped() => {
                tracing::warn!(error = %failure, "Signal extraction unusable, using keyword fallback");
                return Ok(scoring::score_match_fallback(
                    vacancy_text,
                    base_resume,
                    tailored_resume,
                ));
            }
            Err(failure) => return Err(ControlError::from_generate(failure)),
        };

        let signals_json =
            serde_json::to_string(&signals).unwrap_or_else(|_| "{}".to_string());
        let evidence = match self
            .engine
            .generate::<EvidenceMapping, _>(
                &route,
                prompts::EVIDENCE_MAPPING_SYSTEM,
                &prompts::evidence_mapping_prompt(&signals_json, base_resume, tailored_resume),
                options,
                |out| out.validate(),
            )
            .await
        {
            Ok(generated) => {
                self.settle(user, Scenario::DetailedScoring, funds, &generated)
                    .await?;
                generated.value
            }
            Err(failure) if failure.is_json_shaped() => {
                tracing::warn!(error = %failure, "Evidence mapping unusable, using keyword fallback");
                return Ok(scoring::score_match_fallback(
                    vacancy_text,
                    base_resume,
                    tailored_resume,
                ));
            }
            Err(failure) => return Err(ControlError::from_generate(failure)),
        };

        Ok(self.score_match(base_resume, tailored_resume, Some(evidence.items), vacancy_text))
    }

    /// Pure scoring authority: LLM evidence when provided, keyword fallback
    /// otherwise. Never touches the store or the network.
    pub fn score_match(
        &self,
        base_resume: &str,
        tailored_resume: &str,
        evidence: Option<Vec<EvidenceItem>>,
        vacancy_text: &str,
    ) -> MatchScore {
        match evidence {
            Some(items) => {
                let gates = GateFlags {
                    identity_stable: identity_stable(base_resume, tailored_resume),
                    ..GateFlags::default()
                };
                scoring::score(
                    base_resume,
                    tailored_resume,
                    &items,
                    gates,
                    scoring::DETERMINISTIC_V1,
                )
            }
            None => scoring::score_match_fallback(vacancy_text, base_resume, tailored_resume),
        }
    }
}

/// Identity-stability gate: contact handles present in the base resume must
/// survive tailoring.
fn identity_stable(base_resume: &str, tailored_resume: &str) -> bool {
    let tailored_lower = tailored_resume.to_lowercase();
    base_resume
        .split_whitespace()
        .filter(|token| token.contains('@') && token.contains('.'))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.'))
        .filter(|token| !token.is_empty())
        .all(|handle| tailored_lower.contains(&handle.to_lowercase()))
}

/// Require a non-blank input field, before any budget or network cost.
fn require(field: Option<String>, name: &'static str) -> Result<String, ControlError> {
    match field {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ControlError::MissingInput { field: name }),
    }
}

impl ControlPlane {
    /// Dispatch a scenario by name; the typed methods are the primary API.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::MissingInput` when a field the scenario needs
    /// is absent or blank; no spend is authorized for such requests.
    pub async fn run_scenario(
        &self,
        user: &UserContext,
        funds: FundSource,
        scenario: Scenario,
        input: ScenarioInput,
    ) -> Result<ScenarioOutput, ControlError> {
        match scenario {
            Scenario::ResumeParse => {
                let resume_text = require(input.resume_text, "resumeText")?;
                let parsed = self.parse_resume(user, funds, &resume_text).await?;
                Ok(ScenarioOutput::Parsed(parsed))
            }
            Scenario::ResumeTailor => {
                let base_resume = require(input.base_resume, "baseResume")?;
                let vacancy_text = require(input.vacancy_text, "vacancyText")?;
                let tailored = self
                    .tailor_resume(user, funds, &base_resume, &vacancy_text)
                    .await?;
                Ok(ScenarioOutput::Tailored(tailored))
            }
            Scenario::CoverLetter => {
                let base_resume = require(input.base_resume, "baseResume")?;
                let vacancy_text = require(input.vacancy_text, "vacancyText")?;
                let letter = self
                    .cover_letter(user, funds, &base_resume, &vacancy_text)
                    .await?;
                Ok(ScenarioOutput::CoverLetter(letter))
            }
            Scenario::DetailedScoring => {
                let base_resume = require(input.base_resume, "baseResume")?;
                let tailored_resume = require(input.tailored_resume, "tailoredResume")?;
                let vacancy_text = require(input.vacancy_text, "vacancyText")?;
                let score = self
                    .detailed_score(user, funds, &base_resume, &tailored_resume, &vacancy_text)
                    .await?;
                Ok(ScenarioOutput::Score(score))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_stable_when_email_kept() {
        let base = "Ada Lovelace\nada@example.com\nEngineer";
        let tailored = "Ada Lovelace (ada@example.com)\nSenior Engineer";
        assert!(identity_stable(base, tailored));
    }

    #[test]
    fn test_identity_unstable_when_email_dropped() {
        let base = "Ada Lovelace\nada@example.com\nEngineer";
        let tailored = "Grace Hopper\nSenior Engineer";
        assert!(!identity_stable(base, tailored));
    }

    #[test]
    fn test_identity_stable_without_contact_handles() {
        assert!(identity_stable("no contact info here", "still none"));
    }
}
