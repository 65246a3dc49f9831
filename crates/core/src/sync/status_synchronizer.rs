//! Authoritative account status with synthetic fallback.

use chrono::Local;
use log::{debug, warn};
use std::sync::Arc;

use super::app_state::AppState;
use super::events::{DashboardEvent, DashboardEventSink};
use crate::backend::UsageBackend;
use crate::plans::PlanTier;
use crate::usage::{StatusSnapshot, SyntheticDataGenerator};

pub struct StatusSynchronizer {
    backend: Arc<dyn UsageBackend>,
    state: Arc<AppState>,
    generator: Arc<SyntheticDataGenerator>,
    event_sink: Arc<dyn DashboardEventSink>,
}

impl StatusSynchronizer {
    pub fn new(
        backend: Arc<dyn UsageBackend>,
        state: Arc<AppState>,
        generator: Arc<SyntheticDataGenerator>,
        event_sink: Arc<dyn DashboardEventSink>,
    ) -> Self {
        Self {
            backend,
            state,
            generator,
            event_sink,
        }
    }

    /// Fetches status for `user_id` and publishes it as the current snapshot.
    ///
    /// Never fails: any backend failure yields a synthetic snapshot for the
    /// locally selected plan.
    pub async fn fetch_status(&self, user_id: &str) -> StatusSnapshot {
        let snapshot = match self.backend.get_status(user_id).await {
            Ok(response) => {
                let account = self.state.account();
                let reported_plan = response
                    .plan_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string);
                let snapshot = StatusSnapshot::from_server(response, account.selected_plan());

                if let Some(name) = reported_plan {
                    self.converge_plan(name);
                }
                if self.state.mark_online() {
                    debug!("[Sync] Status reads recovered");
                    self.event_sink.emit(DashboardEvent::Recovered);
                }
                snapshot
            }
            Err(err) => {
                warn!(
                    "[Sync] Status fetch failed for {}, using synthetic data: {}",
                    user_id, err
                );
                let plan = self.state.account().selected_plan();
                let snapshot = self.generator.generate(plan, Local::now().date_naive());
                let reason = err.to_string();
                if self.state.mark_degraded(reason.clone()) {
                    self.event_sink.emit(DashboardEvent::Degraded { reason });
                }
                snapshot
            }
        };

        self.state.replace_status(snapshot.clone());
        snapshot
    }

    /// Keeps the local plan converged to the plan the server reports.
    fn converge_plan(&self, plan_name: String) {
        let tier = match plan_name.parse::<PlanTier>() {
            Ok(tier) => Some(tier),
            Err(_) => {
                debug!("[Sync] Server reported unknown plan '{}'", plan_name);
                None
            }
        };
        self.state.update_account(|account| {
            let updated = match tier {
                Some(tier) => account.clone().with_plan(tier),
                None => account.clone(),
            };
            updated.with_current_plan(Some(plan_name))
        });
    }
}
