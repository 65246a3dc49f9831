//! Usage status, history series, and synthetic fallbacks.

mod synthetic;
mod usage_model;

pub use synthetic::*;
pub use usage_model::*;
