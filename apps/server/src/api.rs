//! REST and SSE endpoints consumed by the browser dashboard.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt;
use tracing::info;

use smartpower_core::backend::WriteAck;
use smartpower_core::plans::{PlanSpec, PLAN_CATALOG};
use smartpower_core::sync::{CycleResult, DashboardView, MutationOutcome};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::ServerState;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubscribeBody {
    pub plan_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddUsageBody {
    pub units: f64,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SchedulerBody {
    pub running: bool,
    pub interval_secs: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_secs: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Dashboard
// ─────────────────────────────────────────────────────────────────────────────

async fn get_dashboard(State(state): State<Arc<ServerState>>) -> Json<DashboardView> {
    Json(state.app_state.view())
}

/// One `dashboard` event per view change and one `notification` event per
/// pipeline event.
async fn stream_dashboard(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let views = WatchStream::new(state.app_state.subscribe())
        .map(|view| Event::default().event("dashboard").json_data(&view));
    let notifications = BroadcastStream::new(state.event_bus.subscribe())
        .filter_map(|event| event.ok())
        .map(|event| Event::default().event("notification").json_data(&event));

    Sse::new(views.merge(notifications)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn refresh_now(State(state): State<Arc<ServerState>>) -> Json<CycleResult> {
    Json(state.pipeline.run_cycle().await)
}

async fn list_plans() -> Json<Vec<PlanSpec>> {
    Json(PLAN_CATALOG.to_vec())
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutations
// ─────────────────────────────────────────────────────────────────────────────

async fn subscribe_plan(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<SubscribeBody>,
) -> ApiResult<Json<MutationOutcome<WriteAck>>> {
    info!("[Api] Subscribe to {}", body.plan_name);
    Ok(Json(state.gateway.subscribe(&body.plan_name).await?))
}

async fn add_usage(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<AddUsageBody>,
) -> ApiResult<Json<MutationOutcome<WriteAck>>> {
    let date = body.date.unwrap_or_else(|| Local::now().date_naive());
    Ok(Json(state.gateway.add_usage(body.units, date).await?))
}

async fn register(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<Json<MutationOutcome<String>>> {
    Ok(Json(state.gateway.register(&body.name, &body.email).await?))
}

async fn claim_rewards(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<Json<MutationOutcome<u32>>> {
    Ok(Json(state.gateway.claim_rewards().await?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

async fn set_scheduler(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<SchedulerBody>,
) -> ApiResult<Json<SchedulerStatus>> {
    if body.running {
        let interval = match body.interval_secs {
            Some(secs) => Duration::try_from_secs_f64(secs).map_err(|_| {
                ApiError::BadRequest(format!("Invalid interval_secs {}", secs))
            })?,
            None => state
                .scheduler
                .interval()
                .await
                .unwrap_or(state.refresh_interval),
        };
        state.scheduler.start(interval).await?;
    } else {
        state.scheduler.stop().await;
    }

    let interval = state.scheduler.interval().await;
    Ok(Json(SchedulerStatus {
        running: interval.is_some(),
        interval_secs: interval.map(|d| d.as_secs_f64()),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .route("/refresh", post(refresh_now))
        .route("/plans", get(list_plans))
        .route("/plan/subscribe", post(subscribe_plan))
        .route("/usage", post(add_usage))
        .route("/register", post(register))
        .route("/rewards/claim", post(claim_rewards))
        .route("/scheduler", post(set_scheduler))
}
