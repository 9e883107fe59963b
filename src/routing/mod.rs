//! Routing Resolver module.
//!
//! Maps a (role, scenario) pair to a concrete model assignment. Each scenario
//! carries one scenario-wide default assignment and at most one override per
//! role; an override fully shadows the default and fields are never merged.
//! Model activity is re-checked on every resolve, so a model deactivated
//! after an assignment was created stops being served immediately.

mod error;

pub use error::RoutingError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::catalog::ModelDescriptor;
use crate::store::{CatalogStore, RoutingStore, StoreError};

/// Named generation scenario with independent enable/disable and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    ResumeParse,
    ResumeTailor,
    CoverLetter,
    DetailedScoring,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::ResumeParse,
        Scenario::ResumeTailor,
        Scenario::CoverLetter,
        Scenario::DetailedScoring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::ResumeParse => "resume-parse",
            Scenario::ResumeTailor => "resume-tailor",
            Scenario::CoverLetter => "cover-letter",
            Scenario::DetailedScoring => "detailed-scoring",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-scenario kill switch, independent of any assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioState {
    pub scenario: Scenario,
    pub enabled: bool,
}

/// Expected response shape requested from the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    #[default]
    Text,
    JsonObject,
}

/// Reasoning effort hint for models that support it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// Sampling parameters carried by an assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub response_format: ResponseFormat,
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// A routing assignment: scenario default (`role = None`) or role override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingAssignment {
    pub scenario: Scenario,
    /// `None` for the scenario-wide default, `Some(role)` for an override.
    pub role: Option<String>,
    /// Primary model (catalog id).
    pub model_id: String,
    /// Model used for retry attempts, if any.
    pub retry_model_id: Option<String>,
    pub params: SamplingParams,
    /// Optional named prompt/generation strategy.
    pub strategy: Option<String>,
}

/// Where a resolved route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    RoleOverride,
    ScenarioDefault,
}

/// A fully resolved route: concrete models, parameters, and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoute {
    pub scenario: Scenario,
    pub model: ModelDescriptor,
    /// Retry model, already validated active. An assignment whose retry model
    /// has gone inactive resolves with no retry model rather than failing.
    pub retry_model: Option<ModelDescriptor>,
    pub params: SamplingParams,
    pub strategy: Option<String>,
    pub source: RouteSource,
}

/// Pure-read resolver over the routing and catalog stores.
pub struct Resolver {
    catalog: Arc<dyn CatalogStore>,
    routing: Arc<dyn RoutingStore>,
}

impl Resolver {
    pub fn new(catalog: Arc<dyn CatalogStore>, routing: Arc<dyn RoutingStore>) -> Self {
        Self { catalog, routing }
    }

    /// Resolve the assignment to use for (role, scenario).
    ///
    /// Returns `Ok(None)` when the scenario is missing/disabled or no usable
    /// assignment exists; callers degrade gracefully (hide the feature)
    /// rather than treating this as an error.
    pub async fn resolve(
        &self,
        role: &str,
        scenario: Scenario,
    ) -> Result<Option<ResolvedRoute>, StoreError> {
        let state = self.routing.scenario_state(scenario).await?;
        if !state.map(|s| s.enabled).unwrap_or(false) {
            tracing::debug!(%scenario, "Scenario missing or disabled");
            return Ok(None);
        }

        if let Some(assignment) = self.routing.override_assignment(role, scenario).await? {
            if let Some(model) = self.active_model(&assignment.model_id).await? {
                let route = self
                    .build_route(scenario, model, assignment, RouteSource::RoleOverride)
                    .await?;
                tracing::debug!(%scenario, role, model = %route.model.id, "Resolved role override");
                return Ok(Some(route));
            }
            // Override exists but its model went inactive; fall through to
            // the scenario default.
            tracing::warn!(%scenario, role, "Override model inactive, trying scenario default");
        }

        match self.routing.default_assignment(scenario).await? {
            Some(assignment) => match self.active_model(&assignment.model_id).await? {
                Some(model) => {
                    let route = self
                        .build_route(scenario, model, assignment, RouteSource::ScenarioDefault)
                        .await?;
                    tracing::debug!(%scenario, model = %route.model.id, "Resolved scenario default");
                    Ok(Some(route))
                }
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    async fn build_route(
        &self,
        scenario: Scenario,
        model: ModelDescriptor,
        assignment: RoutingAssignment,
        source: RouteSource,
    ) -> Result<ResolvedRoute, StoreError> {
        let retry_model = match &assignment.retry_model_id {
            Some(id) => self.active_model(id).await?,
            None => None,
        };
        Ok(ResolvedRoute {
            scenario,
            model,
            retry_model,
            params: assignment.params,
            strategy: assignment.strategy,
            source,
        })
    }

    async fn active_model(&self, id: &str) -> Result<Option<ModelDescriptor>, StoreError> {
        Ok(self.catalog.get_model(id).await?.filter(|m| m.is_active()))
    }
}

/// Administrative surface over routing state.
///
/// Referential integrity is enforced at write time: an assignment may only
/// reference currently active models. Resolution re-checks activity anyway,
/// since a model can be deactivated after the assignment was written.
pub struct RoutingAdmin {
    catalog: Arc<dyn CatalogStore>,
    routing: Arc<dyn RoutingStore>,
}

impl RoutingAdmin {
    pub fn new(catalog: Arc<dyn CatalogStore>, routing: Arc<dyn RoutingStore>) -> Self {
        Self { catalog, routing }
    }

    /// Create or replace an assignment.
    ///
    /// # Errors
    ///
    /// Returns `RoutingError::UnknownModel` / `InactiveModel` when the primary
    /// or retry model cannot be selected right now.
    pub async fn put_assignment(&self, assignment: RoutingAssignment) -> Result<(), RoutingError> {
        self.require_active(&assignment.model_id).await?;
        if let Some(retry_id) = &assignment.retry_model_id {
            self.require_active(retry_id).await?;
        }
        tracing::info!(
            scenario = %assignment.scenario,
            role = assignment.role.as_deref().unwrap_or("<default>"),
            model = %assignment.model_id,
            "Routing assignment written"
        );
        self.routing.put_assignment(assignment).await?;
        Ok(())
    }

    pub async fn remove_assignment(
        &self,
        role: Option<&str>,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, RoutingError> {
        Ok(self.routing.remove_assignment(role, scenario).await?)
    }

    /// Flip a scenario's kill switch.
    pub async fn set_scenario_enabled(
        &self,
        scenario: Scenario,
        enabled: bool,
    ) -> Result<(), RoutingError> {
        tracing::info!(%scenario, enabled, "Scenario state changed");
        self.routing
            .put_scenario_state(ScenarioState { scenario, enabled })
            .await?;
        Ok(())
    }

    async fn require_active(&self, model_id: &str) -> Result<(), RoutingError> {
        match self.catalog.get_model(model_id).await? {
            None => Err(RoutingError::UnknownModel(model_id.to_string())),
            Some(model) if !model.is_active() => {
                Err(RoutingError::InactiveModel(model_id.to_string()))
            }
            Some(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_serde_kebab_case() {
        let json = serde_json::to_string(&Scenario::ResumeTailor).unwrap();
        assert_eq!(json, "\"resume-tailor\"");
        let scenario: Scenario = serde_json::from_str("\"detailed-scoring\"").unwrap();
        assert_eq!(scenario, Scenario::DetailedScoring);
    }

    #[test]
    fn test_scenario_display_matches_serde() {
        for scenario in Scenario::ALL {
            let json = serde_json::to_string(&scenario).unwrap();
            assert_eq!(json, format!("\"{scenario}\""));
        }
    }

    #[test]
    fn test_sampling_params_defaults() {
        let params: SamplingParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.temperature, None);
        assert_eq!(params.response_format, ResponseFormat::Text);
        assert_eq!(params.reasoning_effort, None);
    }
}
