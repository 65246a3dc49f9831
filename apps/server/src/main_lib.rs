//! Shared server state and its construction.

use std::sync::Arc;
use std::time::Duration;

use smartpower_core::account::{AccountRepository, KeyValueStore};
use smartpower_core::backend::UsageBackend;
use smartpower_core::sync::{
    AppState, AutoRefreshScheduler, MutationGateway, RefreshPipeline, SyncConfig,
};
use smartpower_core::usage::SyntheticDataGenerator;

use crate::events::EventBus;

pub struct ServerState {
    pub app_state: Arc<AppState>,
    pub pipeline: Arc<RefreshPipeline>,
    pub gateway: MutationGateway,
    pub scheduler: AutoRefreshScheduler,
    pub event_bus: EventBus,
    /// Interval used when the scheduler is started without one.
    pub refresh_interval: Duration,
}

/// Loads (or creates) the local account and wires the engine around it.
pub fn build_state(
    backend: Arc<dyn UsageBackend>,
    store: Arc<dyn KeyValueStore>,
    user_id: Option<&str>,
    config: &SyncConfig,
) -> anyhow::Result<Arc<ServerState>> {
    let accounts = AccountRepository::new(store);
    let fallback_id = format!("user-{}", uuid::Uuid::new_v4());
    let account = accounts.load_or_init(user_id, &fallback_id)?;
    tracing::info!(
        "Account {} on plan {}",
        account.user_id(),
        account.selected_plan()
    );

    let app_state = Arc::new(AppState::new(account, accounts));
    let event_bus = EventBus::new();
    let pipeline = Arc::new(RefreshPipeline::with_parts(
        Arc::clone(&backend),
        Arc::clone(&app_state),
        config,
        Arc::new(SyntheticDataGenerator::new()),
        Arc::new(event_bus.clone()),
    ));

    Ok(Arc::new(ServerState {
        gateway: MutationGateway::new(backend, Arc::clone(&pipeline), config.write_timeout),
        scheduler: AutoRefreshScheduler::new(Arc::clone(&pipeline)),
        app_state,
        pipeline,
        event_bus,
        refresh_interval: config.refresh_interval,
    }))
}
