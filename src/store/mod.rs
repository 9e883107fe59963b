//! Storage collaborator interfaces.
//!
//! The control plane never owns durable state; all cross-request coordination
//! goes through these traits. A relational implementation lives in the host
//! application. [`MemoryStore`] provides a thread-safe in-memory implementation
//! used for tests and single-process deployments.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::{BudgetPeriod, BudgetWindow, FundSource, GlobalBudget, RoleSettings};
use crate::catalog::ModelDescriptor;
use crate::routing::{RoutingAssignment, Scenario, ScenarioState};

/// One line of the append-only usage log.
///
/// Entries are never updated or deleted; rolling spend sums are computed by
/// summing entries newer than a window boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub id: Uuid,
    pub user_id: String,
    /// Scenario or operation name (e.g. "resume-tailor").
    pub operation: String,
    pub funds: FundSource,
    pub cost_usd: f64,
    pub at: DateTime<Utc>,
}

impl UsageEntry {
    pub fn new(
        user_id: impl Into<String>,
        operation: impl Into<String>,
        funds: FundSource,
        cost_usd: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            operation: operation.into(),
            funds,
            cost_usd,
            at: Utc::now(),
        }
    }
}

/// Read/write access to the model catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_model(&self, id: &str) -> Result<Option<ModelDescriptor>, StoreError>;

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, StoreError>;

    /// Upsert a model descriptor keyed by id.
    async fn put_model(&self, model: ModelDescriptor) -> Result<(), StoreError>;

    /// Remove a model, returning it if it existed.
    async fn remove_model(&self, id: &str) -> Result<Option<ModelDescriptor>, StoreError>;
}

/// Read/write access to scenario state and routing assignments.
///
/// Defaults are keyed uniquely by scenario; overrides by (role, scenario).
#[async_trait]
pub trait RoutingStore: Send + Sync {
    async fn scenario_state(&self, scenario: Scenario) -> Result<Option<ScenarioState>, StoreError>;

    async fn put_scenario_state(&self, state: ScenarioState) -> Result<(), StoreError>;

    async fn default_assignment(
        &self,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, StoreError>;

    async fn override_assignment(
        &self,
        role: &str,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, StoreError>;

    /// Upsert an assignment keyed by (role, scenario); `role = None` is the
    /// scenario default.
    async fn put_assignment(&self, assignment: RoutingAssignment) -> Result<(), StoreError>;

    async fn remove_assignment(
        &self,
        role: Option<&str>,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, StoreError>;

    /// All assignments (default or override) whose primary or retry model is
    /// the given model id. Used by the deletion guard.
    async fn assignments_referencing(
        &self,
        model_id: &str,
    ) -> Result<Vec<RoutingAssignment>, StoreError>;
}

/// Read/write access to budget state: role settings, rolling windows, and the
/// single global budget row.
#[async_trait]
pub trait BudgetStore: Send + Sync {
    async fn role_settings(&self, role: &str) -> Result<Option<RoleSettings>, StoreError>;

    async fn put_role_settings(&self, settings: RoleSettings) -> Result<(), StoreError>;

    async fn budget_window(
        &self,
        user_id: &str,
        role: &str,
        period: BudgetPeriod,
    ) -> Result<Option<BudgetWindow>, StoreError>;

    /// Idempotent upsert keyed by (user, role, period); concurrent writers
    /// converge on the same window rather than corrupting state.
    async fn put_budget_window(&self, window: BudgetWindow) -> Result<(), StoreError>;

    async fn global_budget(&self) -> Result<GlobalBudget, StoreError>;

    async fn put_global_budget(&self, budget: GlobalBudget) -> Result<(), StoreError>;
}

/// Append-only usage log.
#[async_trait]
pub trait UsageLog: Send + Sync {
    async fn append(&self, entry: UsageEntry) -> Result<(), StoreError>;

    /// Sum of platform-funded cost for a user since the given instant.
    async fn platform_spend_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<f64, StoreError>;
}

/// Convenience supertrait for wiring a single backing store through the plane.
pub trait ControlStore: CatalogStore + RoutingStore + BudgetStore + UsageLog {}

impl<T: CatalogStore + RoutingStore + BudgetStore + UsageLog> ControlStore for T {}
