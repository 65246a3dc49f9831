//! Reconciliation engine: the refresh pipeline, its scheduler, and the
//! mutation gateway, all writing into one shared view-model.

mod app_state;
mod auto_refresh_scheduler;
mod events;
mod history_aggregator;
mod insights;
mod mutation_gateway;
mod refresh_pipeline;
mod status_synchronizer;
mod sync_config;

pub use app_state::*;
pub use auto_refresh_scheduler::*;
pub use events::*;
pub use history_aggregator::*;
pub use insights::*;
pub use mutation_gateway::*;
pub use refresh_pipeline::*;
pub use status_synchronizer::*;
pub use sync_config::*;

#[cfg(test)]
mod testing;
