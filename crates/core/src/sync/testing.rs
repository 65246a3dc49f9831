//! Scripted in-process backend shared by the sync tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::app_state::AppState;
use super::events::{DashboardEvent, DashboardEventSink};
use crate::account::{AccountRepository, AccountState, InMemoryKeyValueStore};
use crate::backend::*;
use crate::errors::NetworkError;
use crate::plans::PlanTier;

pub const STATUS: &str = "status";
pub const HISTORY: &str = "usage-history";
pub const SUBSCRIBE: &str = "subscribe";
pub const ADD_USAGE: &str = "usage/add";
pub const REGISTER: &str = "register";
pub const CLAIM_REWARDS: &str = "rewards/claim";
pub const COACH: &str = "coach";
pub const PREDICT: &str = "predict-advanced";
pub const ALERTS: &str = "alerts";
pub const REWARDS: &str = "rewards";

#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
    status: Mutex<StatusResponse>,
    history: Mutex<UsageHistoryResponse>,
    register_response: Mutex<RegisterResponse>,
    pub subscribe_requests: Mutex<Vec<SubscribeRequest>>,
    pub add_usage_requests: Mutex<Vec<AddUsageRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    pub fn delay(&self, endpoint: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(endpoint, delay);
    }

    pub fn set_status(&self, status: StatusResponse) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_history(&self, history: UsageHistoryResponse) {
        *self.history.lock().unwrap() = history;
    }

    pub fn set_register_response(&self, response: RegisterResponse) {
        *self.register_response.lock().unwrap() = response;
    }

    pub fn calls(&self, endpoint: &'static str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    async fn enter(&self, endpoint: &'static str) -> BackendResult<()> {
        *self.calls.lock().unwrap().entry(endpoint).or_insert(0) += 1;
        let delay = self.delays.lock().unwrap().get(endpoint).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(NetworkError::transport(format!(
                "connection refused: {}",
                endpoint
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UsageBackend for ScriptedBackend {
    async fn get_status(&self, _user_id: &str) -> BackendResult<StatusResponse> {
        // Captured at request time, like a real response already in flight.
        let status = self.status.lock().unwrap().clone();
        self.enter(STATUS).await?;
        Ok(status)
    }

    async fn get_usage_history(&self, _user_id: &str) -> BackendResult<UsageHistoryResponse> {
        self.enter(HISTORY).await?;
        Ok(self.history.lock().unwrap().clone())
    }

    async fn subscribe(&self, request: &SubscribeRequest) -> BackendResult<WriteAck> {
        self.enter(SUBSCRIBE).await?;
        self.subscribe_requests
            .lock()
            .unwrap()
            .push(request.clone());
        Ok(serde_json::json!({ "message": "subscribed" }))
    }

    async fn add_usage(&self, request: &AddUsageRequest) -> BackendResult<WriteAck> {
        self.enter(ADD_USAGE).await?;
        self.add_usage_requests
            .lock()
            .unwrap()
            .push(request.clone());
        Ok(serde_json::json!({ "message": "Usage updated" }))
    }

    async fn register(&self, _request: &RegisterRequest) -> BackendResult<RegisterResponse> {
        self.enter(REGISTER).await?;
        Ok(self.register_response.lock().unwrap().clone())
    }

    async fn claim_rewards(
        &self,
        _request: &ClaimRewardsRequest,
    ) -> BackendResult<ClaimRewardsResponse> {
        self.enter(CLAIM_REWARDS).await?;
        Ok(ClaimRewardsResponse {
            points_claimed: 10.0,
        })
    }

    async fn get_coach(&self, _user_id: &str) -> BackendResult<CoachResponse> {
        self.enter(COACH).await?;
        Ok(CoachResponse {
            suggestions: vec!["Run the washing machine after 10 PM.".to_string()],
        })
    }

    async fn get_prediction(&self, _user_id: &str) -> BackendResult<PredictionResponse> {
        self.enter(PREDICT).await?;
        Ok(PredictionResponse {
            prediction: 180.0,
            trend: "rising".to_string(),
        })
    }

    async fn get_alerts(&self, _user_id: &str) -> BackendResult<AlertsResponse> {
        self.enter(ALERTS).await?;
        Ok(AlertsResponse { alerts: Vec::new() })
    }

    async fn get_rewards(&self, _user_id: &str) -> BackendResult<RewardsResponse> {
        self.enter(REWARDS).await?;
        Ok(RewardsResponse {
            reward_points: 10.0,
        })
    }
}

pub fn test_state(plan: PlanTier) -> Arc<AppState> {
    let repo = AccountRepository::new(Arc::new(InMemoryKeyValueStore::new()));
    Arc::new(AppState::new(AccountState::new("user1", plan), repo))
}

#[derive(Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DashboardEvent>>>,
}

impl DashboardEventSink for RecordingSink {
    fn emit(&self, event: DashboardEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn recording_sink() -> (Arc<dyn DashboardEventSink>, Arc<Mutex<Vec<DashboardEvent>>>) {
    let sink = RecordingSink::default();
    let events = Arc::clone(&sink.events);
    (Arc::new(sink), events)
}
