//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the hit counter service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HitCounterConfig {
    /// Public listener (gateway + envelope endpoint).
    pub listener: ListenerConfig,

    /// Where requests are forwarded after counting.
    pub downstream: DownstreamConfig,

    /// Counter table settings.
    pub store: StoreConfig,

    /// Behaviour when the counter store fails.
    pub counting: CountingConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Reporting API.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Total time allowed per inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Downstream handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownstreamConfig {
    /// Handler reference: `local:<name>` or `http://host:port/_invoke`.
    pub target: String,

    /// Invocation timeout in milliseconds.
    pub timeout_ms: u64,
}

impl DownstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            target: "local:greeting".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Counter table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Table name; also the snapshot file stem.
    pub table: String,

    /// Directory for snapshots. `None` keeps counts in memory only.
    pub data_dir: Option<String>,

    /// Per-operation timeout in milliseconds.
    pub timeout_ms: u64,

    /// Concurrent read operations allowed (5..=20).
    pub read_capacity: usize,

    /// Snapshot interval in seconds.
    pub flush_interval_secs: u64,
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "hits".to_string(),
            data_dir: None,
            timeout_ms: 1000,
            read_capacity: 5,
            flush_interval_secs: 5,
        }
    }
}

/// What the proxy does when a counter increment fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CountingPolicy {
    /// Abort the request with `CounterUnavailable`; downstream is not invoked.
    #[default]
    Strict,
    /// Log the failure and forward the request anyway.
    BestEffort,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CountingConfig {
    pub policy: CountingPolicy,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "hit_counter=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Reporting API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the reporting API.
    pub enabled: bool,

    /// Bind address; keep it on loopback, the API is unauthenticated.
    pub bind_address: String,

    /// Heading of the HTML table viewer.
    pub title: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            title: "Hello Hits".to_string(),
        }
    }
}
