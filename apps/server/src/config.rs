//! Server configuration from `SMARTPOWER_*` environment variables.

use anyhow::{anyhow, Context};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use smartpower_core::sync::{SyncConfig, DEFAULT_REFRESH_INTERVAL_SECS};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_DB_PATH: &str = "smartpower.db";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8088";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub api_url: String,
    /// Explicit account id. When unset the persisted id is reused.
    pub user_id: Option<String>,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub db_path: PathBuf,
    pub listen_addr: SocketAddr,
    pub insights_enabled: bool,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source. Values are trimmed and
    /// empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = var("SMARTPOWER_API_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let refresh_secs = parse_secs(
            "SMARTPOWER_REFRESH_SECS",
            var("SMARTPOWER_REFRESH_SECS"),
            DEFAULT_REFRESH_INTERVAL_SECS,
        )?;
        let timeout_secs = parse_secs(
            "SMARTPOWER_REQUEST_TIMEOUT_SECS",
            var("SMARTPOWER_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let listen_addr = var("SMARTPOWER_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("SMARTPOWER_LISTEN_ADDR '{}' is not host:port", listen_addr))?;

        let insights_enabled = match var("SMARTPOWER_INSIGHTS") {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| anyhow!("SMARTPOWER_INSIGHTS '{}' is not a boolean", value))?,
            None => true,
        };

        Ok(Self {
            api_url,
            user_id: var("SMARTPOWER_USER_ID"),
            refresh_interval: Duration::from_secs(refresh_secs),
            request_timeout: Duration::from_secs(timeout_secs),
            db_path: PathBuf::from(
                var("SMARTPOWER_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            listen_addr,
            insights_enabled,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            refresh_interval: self.refresh_interval,
            write_timeout: self.request_timeout,
            insights_enabled: self.insights_enabled,
        }
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> anyhow::Result<u64> {
    let Some(value) = value else {
        return Ok(default);
    };
    let secs = value
        .parse::<u64>()
        .with_context(|| format!("{} '{}' is not a whole number of seconds", key, value))?;
    if secs == 0 {
        return Err(anyhow!("{} must be greater than zero", key));
    }
    Ok(secs)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = config(&[("SMARTPOWER_USER_ID", "  ")]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.user_id, None);
        assert_eq!(config.refresh_interval, Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.db_path, PathBuf::from("smartpower.db"));
        assert_eq!(config.listen_addr.port(), 8088);
        assert!(config.insights_enabled);
    }

    #[test]
    fn overrides_are_trimmed_and_parsed() {
        let config = config(&[
            ("SMARTPOWER_API_URL", " http://backend:5000/ "),
            ("SMARTPOWER_USER_ID", "user1"),
            ("SMARTPOWER_REFRESH_SECS", "30"),
            ("SMARTPOWER_INSIGHTS", "off"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "http://backend:5000");
        assert_eq!(config.user_id.as_deref(), Some("user1"));
        assert_eq!(config.sync_config().refresh_interval, Duration::from_secs(30));
        assert!(!config.sync_config().insights_enabled);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(config(&[("SMARTPOWER_REFRESH_SECS", "0")]).is_err());
        assert!(config(&[("SMARTPOWER_REQUEST_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config(&[("SMARTPOWER_LISTEN_ADDR", "localhost")]).is_err());
        assert!(config(&[("SMARTPOWER_INSIGHTS", "maybe")]).is_err());
    }
}
