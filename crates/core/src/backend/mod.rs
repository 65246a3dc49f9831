//! Contract of the usage backend REST API.
//!
//! Wire types mirror the backend's snake_case JSON. Numeric fields are
//! optional because the backend omits or nulls them for fresh accounts.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::NetworkError;

/// Result type for backend calls; every failure is a network failure.
pub type BackendResult<T> = std::result::Result<T, NetworkError>;

/// GET /status/{userId}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default, alias = "plan")]
    pub plan_name: Option<String>,
    #[serde(default)]
    pub plan_limit: Option<f64>,
    #[serde(default)]
    pub month_used: Option<f64>,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    #[serde(default)]
    pub predicted_units: Option<f64>,
    #[serde(default)]
    pub reward_points: Option<f64>,
}

/// GET /usage-history/{userId}
///
/// Values are either a bare number or a `{ "units": .. }` record and are
/// coerced leniently by the history aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageHistoryResponse {
    #[serde(default)]
    pub history: BTreeMap<String, serde_json::Value>,
}

/// POST /subscribe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub user_id: String,
    pub plan_name: String,
    pub plan_units: u32,
    pub price: rust_decimal::Decimal,
}

/// POST /usage/add
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddUsageRequest {
    pub user_id: String,
    pub units: f64,
    pub date: NaiveDate,
}

/// POST /register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

/// Either `{message}` or `{error}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// POST /rewards/claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRewardsRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimRewardsResponse {
    #[serde(default)]
    pub points_claimed: f64,
}

/// Generic acknowledgement body of a successful write.
pub type WriteAck = serde_json::Value;

/// GET /coach/{userId}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachResponse {
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// GET /predict-advanced/{userId}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
    #[serde(default)]
    pub trend: String,
}

/// GET /alerts/{userId}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertsResponse {
    #[serde(default)]
    pub alerts: Vec<String>,
}

/// GET /rewards/{userId}
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardsResponse {
    #[serde(default)]
    pub reward_points: f64,
}

/// Remote usage backend. Implementations must bound every call in time.
#[async_trait]
pub trait UsageBackend: Send + Sync {
    async fn get_status(&self, user_id: &str) -> BackendResult<StatusResponse>;

    async fn get_usage_history(&self, user_id: &str) -> BackendResult<UsageHistoryResponse>;

    async fn subscribe(&self, request: &SubscribeRequest) -> BackendResult<WriteAck>;

    async fn add_usage(&self, request: &AddUsageRequest) -> BackendResult<WriteAck>;

    async fn register(&self, request: &RegisterRequest) -> BackendResult<RegisterResponse>;

    async fn claim_rewards(
        &self,
        request: &ClaimRewardsRequest,
    ) -> BackendResult<ClaimRewardsResponse>;

    async fn get_coach(&self, user_id: &str) -> BackendResult<CoachResponse>;

    async fn get_prediction(&self, user_id: &str) -> BackendResult<PredictionResponse>;

    async fn get_alerts(&self, user_id: &str) -> BackendResult<AlertsResponse>;

    async fn get_rewards(&self, user_id: &str) -> BackendResult<RewardsResponse>;
}
