//! Local mirror of the remote account.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::plans::PlanTier;

/// Usage most recently recorded through this client, awaiting confirmation
/// by the next status fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedUsage {
    pub units: f64,
    pub date: NaiveDate,
}

/// Durable local account state.
///
/// `plan_limit` is never set directly: it is recomputed from the catalog every
/// time the selected plan changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    user_id: String,
    user_email: Option<String>,
    selected_plan: PlanTier,
    /// Plan name last confirmed by a server status response.
    current_plan: Option<String>,
    plan_limit: u32,
    last_recorded_usage: Option<RecordedUsage>,
}

impl AccountState {
    pub fn new(user_id: impl Into<String>, selected_plan: PlanTier) -> Self {
        Self {
            user_id: user_id.into(),
            user_email: None,
            selected_plan,
            current_plan: None,
            plan_limit: selected_plan.limit(),
            last_recorded_usage: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_email(&self) -> Option<&str> {
        self.user_email.as_deref()
    }

    pub fn selected_plan(&self) -> PlanTier {
        self.selected_plan
    }

    pub fn current_plan(&self) -> Option<&str> {
        self.current_plan.as_deref()
    }

    pub fn plan_limit(&self) -> u32 {
        self.plan_limit
    }

    pub fn last_recorded_usage(&self) -> Option<&RecordedUsage> {
        self.last_recorded_usage.as_ref()
    }

    pub fn with_plan(mut self, plan: PlanTier) -> Self {
        self.selected_plan = plan;
        self.plan_limit = plan.limit();
        self
    }

    pub fn with_current_plan(mut self, plan_name: Option<String>) -> Self {
        self.current_plan = plan_name;
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.user_email = email;
        self
    }

    pub fn with_recorded_usage(mut self, usage: RecordedUsage) -> Self {
        self.last_recorded_usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_limit_follows_selected_plan() {
        let account = AccountState::new("user1", PlanTier::Basic);
        assert_eq!(account.plan_limit(), 100);

        let account = account.with_plan(PlanTier::Premium);
        assert_eq!(account.selected_plan(), PlanTier::Premium);
        assert_eq!(account.plan_limit(), 400);
    }
}
