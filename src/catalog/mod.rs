//! Model Catalog module.
//!
//! Registry of the models the platform may invoke, with per-token pricing,
//! context/output caps, and capability flags. Resolution only ever selects
//! models whose status is [`ModelStatus::Active`]; status and pricing are the
//! only operator-editable fields once a model is referenced by an assignment.

mod error;

pub use error::CatalogError;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::provider::ProviderKind;
use crate::store::{CatalogStore, RoutingStore};

/// Model lifecycle status.
///
/// Anything other than `Active` makes the model unselectable by resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    /// Selectable by routing resolution.
    Active,
    /// Temporarily withdrawn by an operator.
    Disabled,
    /// Permanently withdrawn; kept for historical usage records.
    Retired,
}

/// Per-token pricing in USD per 1M tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Price per 1M input tokens (USD).
    pub input_per_million: f64,
    /// Price per 1M output tokens (USD).
    pub output_per_million: f64,
    /// Price per 1M cached input tokens (USD).
    pub cached_input_per_million: f64,
}

impl ModelPricing {
    /// Zero-cost pricing for self-hosted models.
    pub const FREE: ModelPricing = ModelPricing {
        input_per_million: 0.0,
        output_per_million: 0.0,
        cached_input_per_million: 0.0,
    };

    /// Cost in USD for the given realized token counts.
    pub fn cost(&self, input_tokens: u32, output_tokens: u32, cached_input_tokens: u32) -> f64 {
        (self.input_per_million * input_tokens as f64
            + self.output_per_million * output_tokens as f64
            + self.cached_input_per_million * cached_input_tokens as f64)
            / 1_000_000.0
    }
}

/// Capability flags advertised by a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFlags {
    /// Supports native JSON-mode output.
    pub json_mode: bool,
    /// Supports function/tool calls.
    pub tool_calls: bool,
    /// Supports streamed responses.
    pub streaming: bool,
}

/// A model available for routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique catalog id (e.g. "gpt-4o-mini-default").
    pub id: String,
    /// Provider that serves this model.
    pub provider: ProviderKind,
    /// Provider-side model key (e.g. "gpt-4o-mini").
    pub model_key: String,
    pub status: ModelStatus,
    pub pricing: ModelPricing,
    /// Maximum context window in tokens.
    pub context_tokens: u32,
    /// Maximum output tokens, if the provider caps them.
    pub max_output_tokens: Option<u32>,
    pub flags: ModelFlags,
}

impl ModelDescriptor {
    pub fn is_active(&self) -> bool {
        self.status == ModelStatus::Active
    }
}

/// Administrative surface over the model catalog.
///
/// Holds a routing-store handle solely for the referenced-model deletion
/// guard: a model referenced by any default or override assignment cannot be
/// deleted and reports a conflict instead of cascading.
pub struct Catalog {
    models: Arc<dyn CatalogStore>,
    routing: Arc<dyn RoutingStore>,
}

impl Catalog {
    pub fn new(models: Arc<dyn CatalogStore>, routing: Arc<dyn RoutingStore>) -> Self {
        Self { models, routing }
    }

    pub async fn get(&self, id: &str) -> Result<Option<ModelDescriptor>, CatalogError> {
        Ok(self.models.get_model(id).await?)
    }

    pub async fn list(&self) -> Result<Vec<ModelDescriptor>, CatalogError> {
        Ok(self.models.list_models().await?)
    }

    /// Register a new model.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateModel` if the id is already taken.
    pub async fn register(&self, model: ModelDescriptor) -> Result<(), CatalogError> {
        if self.models.get_model(&model.id).await?.is_some() {
            return Err(CatalogError::DuplicateModel(model.id));
        }
        tracing::info!(model = %model.id, provider = ?model.provider, "Model registered");
        self.models.put_model(model).await?;
        Ok(())
    }

    /// Update pricing on an existing model.
    pub async fn update_pricing(
        &self,
        id: &str,
        pricing: ModelPricing,
    ) -> Result<(), CatalogError> {
        let mut model = self
            .models
            .get_model(id)
            .await?
            .ok_or_else(|| CatalogError::ModelNotFound(id.to_string()))?;
        model.pricing = pricing;
        self.models.put_model(model).await?;
        Ok(())
    }

    /// Change the lifecycle status of an existing model.
    ///
    /// Deactivating a model does not touch assignments that reference it;
    /// resolution re-checks status on every read and skips it from then on.
    pub async fn set_status(&self, id: &str, status: ModelStatus) -> Result<(), CatalogError> {
        let mut model = self
            .models
            .get_model(id)
            .await?
            .ok_or_else(|| CatalogError::ModelNotFound(id.to_string()))?;
        model.status = status;
        tracing::info!(model = %id, status = ?status, "Model status changed");
        self.models.put_model(model).await?;
        Ok(())
    }

    /// Delete a model.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ModelReferenced` if any routing assignment still
    /// references the model as primary or retry model.
    pub async fn delete(&self, id: &str) -> Result<ModelDescriptor, CatalogError> {
        let references = self.routing.assignments_referencing(id).await?;
        if !references.is_empty() {
            return Err(CatalogError::ModelReferenced {
                model: id.to_string(),
                count: references.len(),
            });
        }
        self.models
            .remove_model(id)
            .await?
            .ok_or_else(|| CatalogError::ModelNotFound(id.to_string()))
    }
}
