//! Usage API client for the SmartPower backend.
//!
//! Every request is bounded by the client timeout, so no call can hang a
//! refresh cycle or hold the mutation lock indefinitely.

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use smartpower_core::backend::*;

use crate::error::{ApiClientError, Result};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Error body returned by the backend on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct UsageApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl UsageApiClient {
    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[Api] Response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[Api] Response error ({}): {}", status, preview);
    }

    /// Create a new client.
    ///
    /// * `base_url` - backend root, e.g. "http://127.0.0.1:5000"
    /// * `timeout` - upper bound for each request, connect included
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(
                    "[Api] Failed to build HTTP client ({}), using defaults",
                    err
                );
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, resource: &str, user_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            resource,
            urlencoding::encode(user_id)
        )
    }

    /// Parse a JSON response body.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(ApiClientError::api(status.as_u16(), error.error));
            }
            return Err(ApiClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "[Api] Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            ApiClientError::from(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("[Api] GET {}", url);
        let response = self.client.get(&url).send().await?;
        Self::parse_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("[Api] POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// GET /status/{userId}
    pub async fn fetch_status(&self, user_id: &str) -> Result<StatusResponse> {
        self.get_json(self.user_url("status", user_id)).await
    }

    /// GET /usage-history/{userId}
    pub async fn fetch_usage_history(&self, user_id: &str) -> Result<UsageHistoryResponse> {
        self.get_json(self.user_url("usage-history", user_id)).await
    }

    /// POST /subscribe
    pub async fn post_subscribe(&self, request: &SubscribeRequest) -> Result<WriteAck> {
        self.post_json("subscribe", request).await
    }

    /// POST /usage/add
    pub async fn post_usage(&self, request: &AddUsageRequest) -> Result<WriteAck> {
        self.post_json("usage/add", request).await
    }

    /// POST /register
    ///
    /// A rejected registration comes back as `{error}`, usually with a 4xx
    /// status. That body is returned as a response rather than an error so
    /// the caller sees the server's message.
    pub async fn post_register(&self, request: &RegisterRequest) -> Result<RegisterResponse> {
        let url = format!("{}/register", self.base_url);
        debug!("[Api] POST {}", url);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        match serde_json::from_str::<RegisterResponse>(&body) {
            Ok(parsed) if status.is_success() || parsed.error.is_some() => Ok(parsed),
            Ok(_) => Err(ApiClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            )),
            Err(e) if status.is_success() => Err(e.into()),
            Err(_) => Err(ApiClientError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            )),
        }
    }

    /// POST /rewards/claim
    pub async fn post_claim_rewards(
        &self,
        request: &ClaimRewardsRequest,
    ) -> Result<ClaimRewardsResponse> {
        self.post_json("rewards/claim", request).await
    }

    /// GET /coach/{userId}
    pub async fn fetch_coach(&self, user_id: &str) -> Result<CoachResponse> {
        self.get_json(self.user_url("coach", user_id)).await
    }

    /// GET /predict-advanced/{userId}
    pub async fn fetch_prediction(&self, user_id: &str) -> Result<PredictionResponse> {
        self.get_json(self.user_url("predict-advanced", user_id))
            .await
    }

    /// GET /alerts/{userId}
    pub async fn fetch_alerts(&self, user_id: &str) -> Result<AlertsResponse> {
        self.get_json(self.user_url("alerts", user_id)).await
    }

    /// GET /rewards/{userId}
    pub async fn fetch_rewards(&self, user_id: &str) -> Result<RewardsResponse> {
        self.get_json(self.user_url("rewards", user_id)).await
    }
}

#[async_trait]
impl UsageBackend for UsageApiClient {
    async fn get_status(&self, user_id: &str) -> BackendResult<StatusResponse> {
        Ok(self.fetch_status(user_id).await?)
    }

    async fn get_usage_history(&self, user_id: &str) -> BackendResult<UsageHistoryResponse> {
        Ok(self.fetch_usage_history(user_id).await?)
    }

    async fn subscribe(&self, request: &SubscribeRequest) -> BackendResult<WriteAck> {
        Ok(self.post_subscribe(request).await?)
    }

    async fn add_usage(&self, request: &AddUsageRequest) -> BackendResult<WriteAck> {
        Ok(self.post_usage(request).await?)
    }

    async fn register(&self, request: &RegisterRequest) -> BackendResult<RegisterResponse> {
        Ok(self.post_register(request).await?)
    }

    async fn claim_rewards(
        &self,
        request: &ClaimRewardsRequest,
    ) -> BackendResult<ClaimRewardsResponse> {
        Ok(self.post_claim_rewards(request).await?)
    }

    async fn get_coach(&self, user_id: &str) -> BackendResult<CoachResponse> {
        Ok(self.fetch_coach(user_id).await?)
    }

    async fn get_prediction(&self, user_id: &str) -> BackendResult<PredictionResponse> {
        Ok(self.fetch_prediction(user_id).await?)
    }

    async fn get_alerts(&self, user_id: &str) -> BackendResult<AlertsResponse> {
        Ok(self.fetch_alerts(user_id).await?)
    }

    async fn get_rewards(&self, user_id: &str) -> BackendResult<RewardsResponse> {
        Ok(self.fetch_rewards(user_id).await?)
    }
}
