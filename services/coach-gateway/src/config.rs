//! Configuration types for the coach gateway

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::SetupError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Where the analytics service lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Connection pool and timeout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_connections_per_host")]
    pub max_connections_per_host: usize,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,
    #[serde(default = "default_response_timeout")]
    pub response_timeout_seconds: u64,
}

impl TransportConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_seconds)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            max_connections_per_host: default_max_connections_per_host(),
            idle_timeout_seconds: default_idle_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            probe_timeout_seconds: default_probe_timeout(),
            response_timeout_seconds: default_response_timeout(),
        }
    }
}

/// Health probe cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_seconds: u64,
}

impl ConnectivityConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            initial_delay_seconds: default_initial_delay(),
            polling_interval_seconds: default_polling_interval(),
        }
    }
}

/// Background worker pool size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

impl Config {
    /// Reject settings that would deadlock the pool or spin the poller
    pub fn validate(&self) -> Result<(), SetupError> {
        let url = reqwest::Url::parse(&self.backend.base_url).map_err(|e| {
            SetupError::Config(format!(
                "Invalid base_url {:?}: {}",
                self.backend.base_url, e
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SetupError::Config(format!(
                "base_url must be http or https, got {:?}",
                url.scheme()
            )));
        }

        let t = &self.transport;
        if t.max_connections == 0 || t.max_connections_per_host == 0 {
            return Err(SetupError::Config(
                "connection limits must be greater than zero".to_string(),
            ));
        }
        if t.max_connections_per_host > t.max_connections {
            return Err(SetupError::Config(format!(
                "max_connections_per_host ({}) exceeds max_connections ({})",
                t.max_connections_per_host, t.max_connections
            )));
        }
        if t.connect_timeout_seconds == 0
            || t.probe_timeout_seconds == 0
            || t.response_timeout_seconds == 0
        {
            return Err(SetupError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if self.connectivity.polling_interval_seconds == 0 {
            return Err(SetupError::Config(
                "polling_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.dispatch.max_workers == 0 {
            return Err(SetupError::Config(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_max_connections() -> usize {
    20
}

fn default_max_connections_per_host() -> usize {
    10
}

fn default_idle_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    3
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_response_timeout() -> u64 {
    10
}

fn default_initial_delay() -> u64 {
    5
}

fn default_polling_interval() -> u64 {
    10
}

fn default_max_workers() -> usize {
    16
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> Result<Config, SetupError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SetupError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
