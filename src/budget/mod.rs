//! Budget Gate module.
//!
//! Decides whether an LLM call may proceed against platform funds, BYOK
//! funds, or must be refused, before any network cost is incurred. Checks are
//! ordered and first-failure-wins; caps of zero (or unset caps) are a hard
//! off-switch, never "unlimited". Authorization is optimistic check-then-act:
//! two concurrent calls can both pass and both post cost, overshooting a cap
//! by at most one call's cost. That soft-limit semantic is accepted instead
//! of serializing every generation through a reservation lock.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::store::{BudgetStore, StoreError, UsageEntry, UsageLog};

/// Where the money for a call comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FundSource {
    /// Platform-funded call, counted against role and global caps.
    Platform,
    /// Bring-your-own-key: the user's own provider credential pays.
    Byok,
}

/// Rolling budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
}

impl BudgetPeriod {
    /// Fixed period length. Months are 30-day rolling windows, not calendar
    /// months.
    pub fn length(&self) -> Duration {
        match self {
            BudgetPeriod::Weekly => Duration::weeks(1),
            BudgetPeriod::Monthly => Duration::days(30),
        }
    }
}

/// Rolling budget window per (user, role, period).
///
/// Created lazily on first check and advanced forward in whole-period
/// increments whenever "now" has passed `next_reset_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetWindow {
    pub user_id: String,
    pub role: String,
    pub period: BudgetPeriod,
    pub window_start_at: DateTime<Utc>,
    pub next_reset_at: DateTime<Utc>,
}

impl BudgetWindow {
    pub fn new(
        user_id: impl Into<String>,
        role: impl Into<String>,
        period: BudgetPeriod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            period,
            window_start_at: now,
            next_reset_at: now + period.length(),
        }
    }

    /// Advance the window until it contains `now`.
    ///
    /// Loops over whole periods, possibly many at once (e.g. after downtime);
    /// never leaves a window whose `next_reset_at` is still in the past.
    pub fn advanced(mut self, now: DateTime<Utc>) -> Self {
        while self.next_reset_at <= now {
            self.window_start_at = self.next_reset_at;
            self.next_reset_at = self.window_start_at + self.period.length();
        }
        self
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.next_reset_at <= now
    }
}

/// Per-role budget policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSettings {
    pub role: String,
    /// Whether platform-funded calls are allowed at all.
    pub platform_enabled: bool,
    /// Whether BYOK calls are allowed.
    pub byok_enabled: bool,
    /// Caps in USD. `None` or `0` disables platform usage for the role.
    pub daily_cap_usd: Option<f64>,
    pub weekly_cap_usd: Option<f64>,
    pub monthly_cap_usd: Option<f64>,
}

impl RoleSettings {
    /// Locked-down settings used when a role has no stored policy.
    pub fn locked(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            platform_enabled: false,
            byok_enabled: false,
            daily_cap_usd: None,
            weekly_cap_usd: None,
            monthly_cap_usd: None,
        }
    }
}

/// System-wide (cap, used) pair protecting total platform spend.
///
/// `used_usd` grows by realized cost after every successful platform-funded
/// call; it only shrinks via an explicit administrative reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalBudget {
    pub cap_usd: f64,
    pub used_usd: f64,
}

impl GlobalBudget {
    pub fn new(cap_usd: f64) -> Self {
        Self {
            cap_usd,
            used_usd: 0.0,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.used_usd >= self.cap_usd
    }
}

/// Why a spend request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    ByokDisabled,
    PlatformDisabled,
    DailyBudgetDisabled,
    DailyBudgetExceeded,
    WeeklyBudgetDisabled,
    WeeklyBudgetExceeded,
    MonthlyBudgetDisabled,
    MonthlyBudgetExceeded,
    GlobalBudgetExceeded,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenyReason::ByokDisabled => "BYOK_DISABLED",
            DenyReason::PlatformDisabled => "PLATFORM_DISABLED",
            DenyReason::DailyBudgetDisabled => "DAILY_BUDGET_DISABLED",
            DenyReason::DailyBudgetExceeded => "DAILY_BUDGET_EXCEEDED",
            DenyReason::WeeklyBudgetDisabled => "WEEKLY_BUDGET_DISABLED",
            DenyReason::WeeklyBudgetExceeded => "WEEKLY_BUDGET_EXCEEDED",
            DenyReason::MonthlyBudgetDisabled => "MONTHLY_BUDGET_DISABLED",
            DenyReason::MonthlyBudgetExceeded => "MONTHLY_BUDGET_EXCEEDED",
            DenyReason::GlobalBudgetExceeded => "GLOBAL_BUDGET_EXCEEDED",
        };
        f.write_str(s)
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendAuthorization {
    Allowed(FundSource),
    Denied(DenyReason),
}

impl SpendAuthorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SpendAuthorization::Allowed(_))
    }
}

/// The caller on whose behalf a generation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
    pub role: String,
    /// Super-admins bypass role-level checks and per-role caps, but not the
    /// global cap, which protects the whole system's spend.
    pub super_admin: bool,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
            super_admin: false,
        }
    }

    pub fn super_admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: "super_admin".to_string(),
            super_admin: true,
        }
    }
}

/// The gate itself: ordered checks over role settings, rolling windows, and
/// the global cap.
pub struct BudgetGate {
    budget: Arc<dyn BudgetStore>,
    usage: Arc<dyn UsageLog>,
}

impl BudgetGate {
    pub fn new(budget: Arc<dyn BudgetStore>, usage: Arc<dyn UsageLog>) -> Self {
        Self { budget, usage }
    }

    /// Decide whether a call may proceed, without reserving anything.
    pub async fn authorize(
        &self,
        user: &UserContext,
        funds: FundSource,
    ) -> Result<SpendAuthorization, StoreError> {
        self.authorize_at(user, funds, Utc::now()).await
    }

    /// Authorization at an explicit instant. Rolling windows are advanced
    /// lazily here; there is no background reset job.
    pub async fn authorize_at(
        &self,
        user: &UserContext,
        funds: FundSource,
        now: DateTime<Utc>,
    ) -> Result<SpendAuthorization, StoreError> {
        let settings = self
            .budget
            .role_settings(&user.role)
            .await?
            .unwrap_or_else(|| RoleSettings::locked(&user.role));

        if funds == FundSource::Byok {
            if !user.super_admin && !settings.byok_enabled {
                return Ok(SpendAuthorization::Denied(DenyReason::ByokDisabled));
            }
            // BYOK calls spend the user's own key; platform caps do not apply.
            return Ok(SpendAuthorization::Allowed(FundSource::Byok));
        }

        if !user.super_admin {
            if !settings.platform_enabled {
                return Ok(SpendAuthorization::Denied(DenyReason::PlatformDisabled));
            }

            if let Some(denied) = self.check_daily(user, &settings, now).await? {
                return Ok(SpendAuthorization::Denied(denied));
            }
            if let Some(denied) = self
                .check_window(user, &settings, BudgetPeriod::Weekly, now)
                .await?
            {
                return Ok(SpendAuthorization::Denied(denied));
            }
            if let Some(denied) = self
                .check_window(user, &settings, BudgetPeriod::Monthly, now)
                .await?
            {
                return Ok(SpendAuthorization::Denied(denied));
            }
        }

        // Global cap applies even to super-admins.
        let global = self.budget.global_budget().await?;
        if global.exhausted() {
            tracing::warn!(
                used = global.used_usd,
                cap = global.cap_usd,
                "Global budget exhausted"
            );
            return Ok(SpendAuthorization::Denied(DenyReason::GlobalBudgetExceeded));
        }

        Ok(SpendAuthorization::Allowed(FundSource::Platform))
    }

    async fn check_daily(
        &self,
        user: &UserContext,
        settings: &RoleSettings,
        now: DateTime<Utc>,
    ) -> Result<Option<DenyReason>, StoreError> {
        let cap = match settings.daily_cap_usd {
            Some(cap) if cap > 0.0 => cap,
            // Zero or unset means the role may not spend platform funds at
            // all, checked before any actual spend is read.
            _ => return Ok(Some(DenyReason::DailyBudgetDisabled)),
        };
        let day_start = now
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        let spent = self
            .usage
            .platform_spend_since(&user.user_id, day_start)
            .await?;
        if spent >= cap {
            tracing::info!(user = %user.user_id, spent, cap, "Daily budget exceeded");
            return Ok(Some(DenyReason::DailyBudgetExceeded));
        }
        Ok(None)
    }

    async fn check_window(
        &self,
        user: &UserContext,
        settings: &RoleSettings,
        period: BudgetPeriod,
        now: DateTime<Utc>,
    ) -> Result<Option<DenyReason>, StoreError> {
        let (cap, disabled, exceeded) = match period {
            BudgetPeriod::Weekly => (
                settings.weekly_cap_usd,
                DenyReason::WeeklyBudgetDisabled,
                DenyReason::WeeklyBudgetExceeded,
            ),
            BudgetPeriod::Monthly => (
                settings.monthly_cap_usd,
                DenyReason::MonthlyBudgetDisabled,
                DenyReason::MonthlyBudgetExceeded,
            ),
        };
        let cap = match cap {
            Some(cap) if cap > 0.0 => cap,
            _ => return Ok(Some(disabled)),
        };

        let window = match self
            .budget
            .budget_window(&user.user_id, &user.role, period)
            .await?
        {
            Some(window) if window.is_stale(now) => {
                let advanced = window.advanced(now);
                self.budget.put_budget_window(advanced.clone()).await?;
                advanced
            }
            Some(window) => window,
            None => {
                let window = BudgetWindow::new(&user.user_id, &user.role, period, now);
                self.budget.put_budget_window(window.clone()).await?;
                window
            }
        };

        let spent = self
            .usage
            .platform_spend_since(&user.user_id, window.window_start_at)
            .await?;
        if spent >= cap {
            tracing::info!(user = %user.user_id, ?period, spent, cap, "Rolling budget exceeded");
            return Ok(Some(exceeded));
        }
        Ok(None)
    }

    /// Report realized cost after a successful call.
    ///
    /// Appends to the usage log; platform-funded calls also increment the
    /// global budget's used amount. The upsert converges under concurrent
    /// writers, but authorization remains a soft limit (see module docs).
    pub async fn post_usage(
        &self,
        user: &UserContext,
        operation: &str,
        funds: FundSource,
        cost_usd: f64,
    ) -> Result<(), StoreError> {
        self.usage
            .append(UsageEntry::new(&user.user_id, operation, funds, cost_usd))
            .await?;
        if funds == FundSource::Platform {
            let mut global = self.budget.global_budget().await?;
            global.used_usd += cost_usd;
            self.budget.put_global_budget(global).await?;
        }
        tracing::debug!(user = %user.user_id, operation, ?funds, cost_usd, "Usage posted");
        Ok(())
    }

    /// Administrative reset of the global used amount. The only way it ever
    /// decreases.
    pub async fn reset_global_used(&self) -> Result<(), StoreError> {
        let mut global = self.budget.global_budget().await?;
        tracing::info!(previous = global.used_usd, "Global budget usage reset");
        global.used_usd = 0.0;
        self.budget.put_global_budget(global).await?;
        Ok(())
    }
}
