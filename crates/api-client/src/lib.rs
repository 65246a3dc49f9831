//! HTTP client for the SmartPower usage backend.

mod client;
mod error;

pub use client::{UsageApiClient, DEFAULT_TIMEOUT_SECS};
pub use error::{ApiClientError, Result};
