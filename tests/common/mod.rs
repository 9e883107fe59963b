//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tailorplane::budget::RoleSettings;
use tailorplane::catalog::{ModelDescriptor, ModelFlags, ModelPricing, ModelStatus};
use tailorplane::control::ControlPlane;
use tailorplane::invocation::GenerateOptions;
use tailorplane::provider::{
    Completion, Invocation, ModelProvider, ProviderError, ProviderKind, ProviderRegistry,
    TokenUsage,
};
use tailorplane::routing::{RoutingAssignment, SamplingParams, Scenario, ScenarioState};
use tailorplane::store::{CatalogStore, MemoryStore, RoutingStore};

/// Provider stub that replays a queue of scripted outcomes and counts calls.
pub struct ScriptedProvider {
    kind: ProviderKind,
    script: Mutex<VecDeque<Result<Completion, ProviderError>>>,
    calls: AtomicU32,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            script: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn push_text(self: &Arc<Self>, text: &str, cost_usd: f64) {
        self.script.lock().unwrap().push_back(Ok(Completion {
            text: text.to_string(),
            usage: TokenUsage {
                input_tokens: 500,
                output_tokens: 200,
                cached_input_tokens: 0,
            },
            cost_usd,
        }));
    }

    pub fn push_error(self: &Arc<Self>, error: ProviderError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Queue the same malformed response n times.
    pub fn push_text_repeated(self: &Arc<Self>, text: &str, cost_usd: f64, n: usize) {
        for _ in 0..n {
            self.push_text(text, cost_usd);
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn default_model(&self) -> &str {
        "scripted-default"
    }

    fn cost_model(&self, _model_key: &str) -> ModelPricing {
        ModelPricing::FREE
    }

    async fn validate_key(&self, _api_key: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn invoke(&self, _request: Invocation) -> Result<Completion, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Generic("script exhausted".to_string())))
    }
}

pub fn model(id: &str, status: ModelStatus) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        provider: ProviderKind::OpenAi,
        model_key: format!("{id}-key"),
        status,
        pricing: ModelPricing {
            input_per_million: 2.50,
            output_per_million: 10.00,
            cached_input_per_million: 1.25,
        },
        context_tokens: 128_000,
        max_output_tokens: Some(16_384),
        flags: ModelFlags {
            json_mode: true,
            tool_calls: false,
            streaming: false,
        },
    }
}

pub fn default_assignment(scenario: Scenario, model_id: &str) -> RoutingAssignment {
    RoutingAssignment {
        scenario,
        role: None,
        model_id: model_id.to_string(),
        retry_model_id: None,
        params: SamplingParams::default(),
        strategy: None,
    }
}

pub fn override_assignment(scenario: Scenario, role: &str, model_id: &str) -> RoutingAssignment {
    RoutingAssignment {
        scenario,
        role: Some(role.to_string()),
        model_id: model_id.to_string(),
        retry_model_id: None,
        params: SamplingParams::default(),
        strategy: None,
    }
}

pub fn open_role(role: &str) -> RoleSettings {
    RoleSettings {
        role: role.to_string(),
        platform_enabled: true,
        byok_enabled: true,
        daily_cap_usd: Some(5.0),
        weekly_cap_usd: Some(20.0),
        monthly_cap_usd: Some(60.0),
    }
}

/// Store with one enabled scenario routed to one active model.
pub async fn seeded_store(scenario: Scenario, global_cap_usd: f64) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new(global_cap_usd));
    store.put_model(model("m-primary", ModelStatus::Active)).await.unwrap();
    store
        .put_scenario_state(ScenarioState {
            scenario,
            enabled: true,
        })
        .await
        .unwrap();
    store
        .put_assignment(default_assignment(scenario, "m-primary"))
        .await
        .unwrap();
    store
}

pub fn plane(
    store: Arc<MemoryStore>,
    provider: Arc<ScriptedProvider>,
    max_retries: u32,
) -> ControlPlane {
    let providers = ProviderRegistry::new().with_provider(provider);
    ControlPlane::new(
        store,
        providers,
        GenerateOptions {
            max_retries,
            repair_truncation: false,
        },
    )
}
