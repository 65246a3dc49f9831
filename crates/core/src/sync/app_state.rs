//! Shared reconciled view-model.
//!
//! Every component receives an `Arc<AppState>` instead of touching globals.
//! Writers replace one field of [`DashboardView`] as a whole; each write goes
//! through [`AppState::render`], which notifies all subscribed renderers.

use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::watch;

use crate::account::{AccountRepository, AccountState};
use crate::notifications::Alert;
use crate::recommendation::Recommendation;
use crate::usage::{DataSource, StatusSnapshot, UsageSeries};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Online,
    /// Reads are failing and synthetic data is on screen.
    Degraded {
        since: DateTime<Utc>,
        reason: String,
    },
}

/// Secondary reads that fall back to local data on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadSection {
    History,
    Coach,
    Prediction,
    Alerts,
    Rewards,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsagePrediction {
    pub units: f64,
    pub trend: String,
}

/// Secondary backend reads. Each part degrades on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub suggestions: Vec<String>,
    pub prediction: Option<UsagePrediction>,
    pub server_alerts: Vec<String>,
    pub reward_points: Option<u32>,
    /// `Synthetic` when at least one part fell back to local data.
    pub source: DataSource,
}

impl Default for Insights {
    fn default() -> Self {
        Self {
            suggestions: Vec::new(),
            prediction: None,
            server_alerts: Vec::new(),
            reward_points: None,
            source: DataSource::Synthetic,
        }
    }
}

/// What renderers draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub account: AccountState,
    pub status: Option<StatusSnapshot>,
    pub history: UsageSeries,
    pub recommendation: Option<Recommendation>,
    pub alert: Option<Alert>,
    pub insights: Insights,
    pub connection: ConnectionStatus,
    /// Sections currently showing demo or local data.
    pub fallback_sections: BTreeSet<ReadSection>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub cycle_count: u64,
}

impl DashboardView {
    pub fn new(account: AccountState) -> Self {
        Self {
            account,
            status: None,
            history: UsageSeries::demo(),
            recommendation: None,
            alert: None,
            insights: Insights::default(),
            connection: ConnectionStatus::Online,
            fallback_sections: BTreeSet::new(),
            last_refreshed_at: None,
            cycle_count: 0,
        }
    }
}

pub struct AppState {
    view: watch::Sender<DashboardView>,
    accounts: AccountRepository,
}

impl AppState {
    pub fn new(account: AccountState, accounts: AccountRepository) -> Self {
        let (view, _) = watch::channel(DashboardView::new(account));
        Self { view, accounts }
    }

    /// Registers a renderer. The receiver always sees the latest view.
    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn account(&self) -> AccountState {
        self.view.borrow().account.clone()
    }

    /// Single mutation hook: applies `update` and notifies renderers.
    pub fn render(&self, update: impl FnOnce(&mut DashboardView)) {
        self.view.send_modify(update);
    }

    /// Read-modify-write of the account under the view lock, so concurrent
    /// updates never overwrite each other and persistence happens in the same
    /// order renderers see. Unchanged accounts are neither persisted nor
    /// rendered. Persistence failures are logged, never propagated: the
    /// in-memory mirror stays authoritative.
    pub fn update_account(&self, update: impl FnOnce(&AccountState) -> AccountState) {
        self.view.send_if_modified(|view| {
            let updated = update(&view.account);
            if updated == view.account {
                return false;
            }
            if let Err(err) = self.accounts.save(&updated) {
                warn!("[Storage] Failed to persist account state: {}", err);
            }
            view.account = updated;
            true
        });
    }

    pub fn replace_status(&self, status: StatusSnapshot) {
        self.render(|view| view.status = Some(status));
    }

    pub fn replace_history(&self, history: UsageSeries) {
        self.render(|view| view.history = history);
    }

    pub fn replace_recommendation(&self, recommendation: Option<Recommendation>) {
        self.render(|view| view.recommendation = recommendation);
    }

    pub fn replace_alert(&self, alert: Option<Alert>) {
        self.render(|view| view.alert = alert);
    }

    pub fn replace_insights(&self, insights: Insights) {
        self.render(|view| view.insights = insights);
    }

    /// Marks reads as failing. Returns `true` on the online → degraded transition.
    pub fn mark_degraded(&self, reason: String) -> bool {
        let mut transitioned = false;
        self.render(|view| {
            let since = match &view.connection {
                ConnectionStatus::Degraded { since, .. } => *since,
                ConnectionStatus::Online => {
                    transitioned = true;
                    Utc::now()
                }
            };
            view.connection = ConnectionStatus::Degraded { since, reason };
        });
        transitioned
    }

    /// Marks reads as healthy. Returns `true` on the degraded → online transition.
    pub fn mark_online(&self) -> bool {
        let mut transitioned = false;
        self.render(|view| {
            transitioned = matches!(view.connection, ConnectionStatus::Degraded { .. });
            view.connection = ConnectionStatus::Online;
        });
        transitioned
    }

    /// Flags `section` as showing local data. Returns `true` when it was not
    /// already flagged.
    pub fn mark_fallback(&self, section: ReadSection) -> bool {
        let mut inserted = false;
        self.view.send_if_modified(|view| {
            inserted = view.fallback_sections.insert(section);
            inserted
        });
        inserted
    }

    /// Clears the flag for `section`. Returns `true` when it was set.
    pub fn clear_fallback(&self, section: ReadSection) -> bool {
        let mut removed = false;
        self.view.send_if_modified(|view| {
            removed = view.fallback_sections.remove(&section);
            removed
        });
        removed
    }

    pub fn finish_cycle(&self, finished_at: DateTime<Utc>) {
        self.render(|view| {
            view.last_refreshed_at = Some(finished_at);
            view.cycle_count += 1;
        });
    }
}
