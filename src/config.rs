//! Service configuration.
//!
//! Loaded once at startup (file and/or CLI flags) and immutable afterwards.
//! Every field has a default so a bare `turnstile serve` works against the
//! in-memory store with the reference timings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::PartitionStrategy;
use crate::http_server::HttpServerConfig;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Admission capacity configuration.
///
/// `max_active = min(live_replicas * base_units_per_replica, max_global_limit)`.
/// Not mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Admission units each live replica contributes
    #[serde(default = "default_base_units")]
    pub base_units_per_replica: u64,

    /// Hard ceiling regardless of replica count
    #[serde(default = "default_max_global_limit")]
    pub max_global_limit: u64,

    /// When false, capacity is always fallback_replica_count * base units
    #[serde(default = "default_true")]
    pub dynamic_scaling_enabled: bool,

    /// Replica count assumed when discovery is unavailable or disabled
    #[serde(default = "default_fallback_replicas")]
    pub fallback_replica_count: u32,
}

fn default_base_units() -> u64 {
    50
}

fn default_max_global_limit() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_fallback_replicas() -> u32 {
    1
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            base_units_per_replica: default_base_units(),
            max_global_limit: default_max_global_limit(),
            dynamic_scaling_enabled: default_true(),
            fallback_replica_count: default_fallback_replicas(),
        }
    }
}

/// Timings for the periodic loops, in the reference configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Promotion loop period in milliseconds
    #[serde(default = "default_promotion_interval_ms")]
    pub promotion_interval_ms: u64,

    /// Expiry sweep period in milliseconds
    #[serde(default = "default_expiry_interval_ms")]
    pub expiry_interval_ms: u64,

    /// Utilization/queue-size sampling period in milliseconds
    #[serde(default = "default_metrics_interval_ms")]
    pub metrics_sample_interval_ms: u64,

    /// Throughput snapshot-and-reset period in milliseconds
    #[serde(default = "default_throughput_interval_ms")]
    pub throughput_sample_interval_ms: u64,

    /// Replica heartbeat refresh period in milliseconds
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

fn default_promotion_interval_ms() -> u64 {
    2_000
}

fn default_expiry_interval_ms() -> u64 {
    10_000
}

fn default_metrics_interval_ms() -> u64 {
    10_000
}

fn default_throughput_interval_ms() -> u64 {
    60_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            promotion_interval_ms: default_promotion_interval_ms(),
            expiry_interval_ms: default_expiry_interval_ms(),
            metrics_sample_interval_ms: default_metrics_interval_ms(),
            throughput_sample_interval_ms: default_throughput_interval_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Capacity calculation parameters
    #[serde(default)]
    pub capacity: CapacityConfig,

    /// Periodic loop timings
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Active-session timeout in seconds; non-positive disables the sweep
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: i64,

    /// Upper bound on any single shared-store call, in milliseconds
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// How long since the last heartbeat a replica still counts as live
    #[serde(default = "default_liveness_window_secs")]
    pub replica_liveness_window_secs: i64,

    /// Which replica drives promotion for a given resource
    #[serde(default)]
    pub partition_strategy: PartitionStrategy,

    /// HTTP bind and CORS settings
    #[serde(default)]
    pub http: HttpServerConfig,
}

fn default_session_timeout_secs() -> i64 {
    300
}

fn default_store_timeout_ms() -> u64 {
    800
}

fn default_liveness_window_secs() -> i64 {
    300
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            capacity: CapacityConfig::default(),
            schedule: ScheduleConfig::default(),
            session_timeout_secs: default_session_timeout_secs(),
            store_timeout_ms: default_store_timeout_ms(),
            replica_liveness_window_secs: default_liveness_window_secs(),
            partition_strategy: PartitionStrategy::default(),
            http: HttpServerConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Session timeout as a std Duration, `None` when the sweep is disabled.
    pub fn session_timeout(&self) -> Option<std::time::Duration> {
        if self.session_timeout_secs > 0 {
            Some(std::time::Duration::from_secs(self.session_timeout_secs as u64))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_configuration() {
        let config = ServiceConfig::default();
        assert_eq!(config.schedule.promotion_interval_ms, 2_000);
        assert_eq!(config.schedule.expiry_interval_ms, 10_000);
        assert_eq!(config.capacity.fallback_replica_count, 1);
        assert!(config.capacity.dynamic_scaling_enabled);
        assert_eq!(config.replica_liveness_window_secs, 300);
    }

    #[test]
    fn empty_json_fills_every_default() {
        let config: ServiceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.store_timeout_ms, 800);
        assert_eq!(config.session_timeout_secs, 300);
        assert!(config.session_timeout().is_some());
    }

    #[test]
    fn non_positive_timeout_disables_sweep() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"session_timeout_secs": 0}"#).unwrap();
        assert!(config.session_timeout().is_none());
    }

    #[test]
    fn partial_section_keeps_sibling_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"capacity": {"max_global_limit": 42}}"#).unwrap();
        assert_eq!(config.capacity.max_global_limit, 42);
        assert_eq!(config.capacity.base_units_per_replica, 50);
    }
}
