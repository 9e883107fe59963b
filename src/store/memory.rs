//! Thread-safe in-memory store.
//!
//! Uses lock-free concurrent maps (DashMap) for the keyed tables and a mutex
//! for the single global-budget row and the usage log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;

use crate::budget::{BudgetPeriod, BudgetWindow, FundSource, GlobalBudget, RoleSettings};
use crate::catalog::ModelDescriptor;
use crate::routing::{RoutingAssignment, Scenario, ScenarioState};

use super::{BudgetStore, CatalogStore, RoutingStore, StoreError, UsageEntry, UsageLog};

/// In-memory implementation of all storage collaborator traits.
pub struct MemoryStore {
    models: DashMap<String, ModelDescriptor>,
    scenario_states: DashMap<Scenario, ScenarioState>,
    assignments: DashMap<(Option<String>, Scenario), RoutingAssignment>,
    role_settings: DashMap<String, RoleSettings>,
    windows: DashMap<(String, String, BudgetPeriod), BudgetWindow>,
    global_budget: Mutex<GlobalBudget>,
    usage: Mutex<Vec<UsageEntry>>,
}

impl MemoryStore {
    /// Create an empty store with the given global platform cap.
    pub fn new(global_cap_usd: f64) -> Self {
        Self {
            models: DashMap::new(),
            scenario_states: DashMap::new(),
            assignments: DashMap::new(),
            role_settings: DashMap::new(),
            windows: DashMap::new(),
            global_budget: Mutex::new(GlobalBudget::new(global_cap_usd)),
            usage: Mutex::new(Vec::new()),
        }
    }

    fn lock_poisoned() -> StoreError {
        StoreError::Unavailable("in-memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_model(&self, id: &str) -> Result<Option<ModelDescriptor>, StoreError> {
        Ok(self.models.get(id).map(|m| m.clone()))
    }

    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, StoreError> {
        let mut models: Vec<ModelDescriptor> =
            self.models.iter().map(|m| m.value().clone()).collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }

    async fn put_model(&self, model: ModelDescriptor) -> Result<(), StoreError> {
        self.models.insert(model.id.clone(), model);
        Ok(())
    }

    async fn remove_model(&self, id: &str) -> Result<Option<ModelDescriptor>, StoreError> {
        Ok(self.models.remove(id).map(|(_, m)| m))
    }
}

#[async_trait]
impl RoutingStore for MemoryStore {
    async fn scenario_state(
        &self,
        scenario: Scenario,
    ) -> Result<Option<ScenarioState>, StoreError> {
        Ok(self.scenario_states.get(&scenario).map(|s| s.clone()))
    }

    async fn put_scenario_state(&self, state: ScenarioState) -> Result<(), StoreError> {
        self.scenario_states.insert(state.scenario, state);
        Ok(())
    }

    async fn default_assignment(
        &self,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, StoreError> {
        Ok(self.assignments.get(&(None, scenario)).map(|a| a.clone()))
    }

    async fn override_assignment(
        &self,
        role: &str,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, StoreError> {
        Ok(self
            .assignments
            .get(&(Some(role.to_string()), scenario))
            .map(|a| a.clone()))
    }

    async fn put_assignment(&self, assignment: RoutingAssignment) -> Result<(), StoreError> {
        let key = (assignment.role.clone(), assignment.scenario);
        self.assignments.insert(key, assignment);
        Ok(())
    }

    async fn remove_assignment(
        &self,
        role: Option<&str>,
        scenario: Scenario,
    ) -> Result<Option<RoutingAssignment>, StoreError> {
        let key = (role.map(|r| r.to_string()), scenario);
        Ok(self.assignments.remove(&key).map(|(_, a)| a))
    }

    async fn assignments_referencing(
        &self,
        model_id: &str,
    ) -> Result<Vec<RoutingAssignment>, StoreError> {
        let mut hits: Vec<RoutingAssignment> = self
            .assignments
            .iter()
            .filter(|a| {
                a.model_id == model_id || a.retry_model_id.as_deref() == Some(model_id)
            })
            .map(|a| a.value().clone())
            .collect();
        hits.sort_by_key(|a| (a.role.clone(), a.scenario));
        Ok(hits)
    }
}

#[async_trait]
impl BudgetStore for MemoryStore {
    async fn role_settings(&self, role: &str) -> Result<Option<RoleSettings>, StoreError> {
        Ok(self.role_settings.get(role).map(|s| s.clone()))
    }

    async fn put_role_settings(&self, settings: RoleSettings) -> Result<(), StoreError> {
        self.role_settings.insert(settings.role.clone(), settings);
        Ok(())
    }

    async fn budget_window(
        &self,
        user_id: &str,
        role: &str,
        period: BudgetPeriod,
    ) -> Result<Option<BudgetWindow>, StoreError> {
        let key = (user_id.to_string(), role.to_string(), period);
        Ok(self.windows.get(&key).map(|w| w.clone()))
    }

    async fn put_budget_window(&self, window: BudgetWindow) -> Result<(), StoreError> {
        let key = (window.user_id.clone(), window.role.clone(), window.period);
        self.windows.insert(key, window);
        Ok(())
    }

    async fn global_budget(&self) -> Result<GlobalBudget, StoreError> {
        let budget = self.global_budget.lock().map_err(|_| Self::lock_poisoned())?;
        Ok(budget.clone())
    }

    async fn put_global_budget(&self, budget: GlobalBudget) -> Result<(), StoreError> {
        let mut row = self.global_budget.lock().map_err(|_| Self::lock_poisoned())?;
        *row = budget;
        Ok(())
    }
}

#[async_trait]
impl UsageLog for MemoryStore {
    async fn append(&self, entry: UsageEntry) -> Result<(), StoreError> {
        let mut log = self.usage.lock().map_err(|_| Self::lock_poisoned())?;
        log.push(entry);
        Ok(())
    }

    async fn platform_spend_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<f64, StoreError> {
        let log = self.usage.lock().map_err(|_| Self::lock_poisoned())?;
        Ok(log
            .iter()
            .filter(|e| e.user_id == user_id && e.funds == FundSource::Platform && e.at >= since)
            .map(|e| e.cost_usd)
            .sum())
    }
}
