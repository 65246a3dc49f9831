//! Client-side sync and reconciliation engine for subscription and usage state.

pub mod account;
pub mod backend;
pub mod errors;
pub mod notifications;
pub mod plans;
pub mod recommendation;
pub mod sync;
pub mod usage;

pub use errors::{Error, NetworkError, Result};
