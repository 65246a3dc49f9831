//! User-initiated writes with single-flight exclusivity.
//!
//! At most one write is in flight process-wide. Input is validated before the
//! lock is taken; a busy gateway rejects new writes without issuing a request.
//! A successful write is applied optimistically to the account and then
//! followed by exactly one refresh cycle.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::app_state::AppState;
use super::refresh_pipeline::{CycleResult, RefreshPipeline};
use crate::account::RecordedUsage;
use crate::backend::{
    AddUsageRequest, BackendResult, ClaimRewardsRequest, RegisterRequest, SubscribeRequest,
    UsageBackend, WriteAck,
};
use crate::errors::{Error, NetworkError, Result};
use crate::plans::PlanTier;

/// Result of a successful mutation plus the resynchronisation it triggered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcome<T> {
    pub response: T,
    pub cycle: CycleResult,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub fn validate_units(units: f64) -> Result<()> {
    if !units.is_finite() || units <= 0.0 {
        return Err(Error::validation(format!(
            "Units must be a positive number, got {}",
            units
        )));
    }
    Ok(())
}

fn validate_registration(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    let valid_email = email
        .trim()
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty() && !domain.contains('@'))
        .unwrap_or(false);
    if !valid_email {
        return Err(Error::validation(format!("Invalid email '{}'", email.trim())));
    }
    Ok(())
}

pub struct MutationGateway {
    backend: Arc<dyn UsageBackend>,
    state: Arc<AppState>,
    pipeline: Arc<RefreshPipeline>,
    in_flight: AtomicBool,
    write_timeout: Duration,
}

impl MutationGateway {
    pub fn new(
        backend: Arc<dyn UsageBackend>,
        pipeline: Arc<RefreshPipeline>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            state: pipeline.state(),
            pipeline,
            in_flight: AtomicBool::new(false),
            write_timeout,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::Busy)?;
        Ok(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    async fn dispatch<T>(
        &self,
        label: &str,
        request: impl Future<Output = BackendResult<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.write_timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!("[Mutation] {} failed: {}", label, err);
                Err(Error::Network(err))
            }
            Err(_) => {
                warn!(
                    "[Mutation] {} timed out after {:?}",
                    label, self.write_timeout
                );
                Err(Error::Network(NetworkError::timeout(label)))
            }
        }
    }

    async fn resync<T>(&self, response: T) -> MutationOutcome<T> {
        let cycle = self.pipeline.run_cycle().await;
        MutationOutcome { response, cycle }
    }

    /// POST /subscribe, then select the plan locally.
    pub async fn subscribe(&self, plan_name: &str) -> Result<MutationOutcome<WriteAck>> {
        let plan = plan_name.parse::<PlanTier>()?;
        let guard = self.begin()?;

        let request = SubscribeRequest {
            user_id: self.state.account().user_id().to_string(),
            plan_name: plan.as_str().to_string(),
            plan_units: plan.limit(),
            price: plan.price(),
        };
        info!(
            "[Mutation] Subscribing {} to {}",
            request.user_id, request.plan_name
        );
        let ack = self
            .dispatch("POST /subscribe", self.backend.subscribe(&request))
            .await?;

        self.state
            .update_account(|account| account.clone().with_plan(plan));
        drop(guard);

        Ok(self.resync(ack).await)
    }

    /// POST /usage/add, then remember the usage locally.
    pub async fn add_usage(&self, units: f64, date: NaiveDate) -> Result<MutationOutcome<WriteAck>> {
        validate_units(units)?;
        let guard = self.begin()?;

        let request = AddUsageRequest {
            user_id: self.state.account().user_id().to_string(),
            units,
            date,
        };
        debug!(
            "[Mutation] Adding {} units for {} on {}",
            units, request.user_id, date
        );
        let ack = self
            .dispatch("POST /usage/add", self.backend.add_usage(&request))
            .await?;

        self.state.update_account(|account| {
            account
                .clone()
                .with_recorded_usage(RecordedUsage { units, date })
        });
        drop(guard);

        Ok(self.resync(ack).await)
    }

    /// POST /register, then store the email locally.
    pub async fn register(&self, name: &str, email: &str) -> Result<MutationOutcome<String>> {
        validate_registration(name, email)?;
        let guard = self.begin()?;

        let email = email.trim().to_string();
        let request = RegisterRequest {
            user_id: self.state.account().user_id().to_string(),
            name: name.trim().to_string(),
            email: email.clone(),
        };
        let response = self
            .dispatch("POST /register", self.backend.register(&request))
            .await?;
        if let Some(error) = response.error {
            warn!("[Mutation] Registration rejected: {}", error);
            return Err(Error::Network(NetworkError::transport(format!(
                "Registration rejected: {}",
                error
            ))));
        }

        self.state
            .update_account(|account| account.clone().with_email(Some(email)));
        drop(guard);

        let message = response
            .message
            .unwrap_or_else(|| "Registered".to_string());
        Ok(self.resync(message).await)
    }

    /// POST /rewards/claim. Returns the number of points claimed.
    pub async fn claim_rewards(&self) -> Result<MutationOutcome<u32>> {
        let guard = self.begin()?;

        let request = ClaimRewardsRequest {
            user_id: self.state.account().user_id().to_string(),
        };
        let response = self
            .dispatch("POST /rewards/claim", self.backend.claim_rewards(&request))
            .await?;
        drop(guard);

        let points = if response.points_claimed.is_finite() {
            response.points_claimed.max(0.0).round() as u32
        } else {
            0
        };
        info!("[Mutation] Claimed {} reward points", points);
        Ok(self.resync(points).await)
    }
}
