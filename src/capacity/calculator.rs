//! Dynamic admission-capacity calculation.

use std::sync::Arc;

use crate::config::CapacityConfig;
use crate::observability::Logger;

use super::discovery::ReplicaDiscovery;

/// Computes the admission ceiling from the live replica count.
///
/// `max_active = min(live_replicas * base_units_per_replica,
/// max_global_limit)`. Never blocks on a broken discovery backend and never
/// errors outward: any failure degrades to the configured fallback replica
/// count and is logged.
pub struct CapacityCalculator {
    config: CapacityConfig,
    discovery: Arc<dyn ReplicaDiscovery>,
}

impl CapacityCalculator {
    pub fn new(config: CapacityConfig, discovery: Arc<dyn ReplicaDiscovery>) -> Self {
        Self { config, discovery }
    }

    /// Current max concurrently-active members per resource.
    ///
    /// Recomputed on every call so capacity follows replica scaling within
    /// one promotion cycle.
    pub async fn max_active(&self) -> u64 {
        let replicas = self.effective_replica_count().await;
        (u64::from(replicas))
            .saturating_mul(self.config.base_units_per_replica)
            .min(self.config.max_global_limit)
    }

    /// The replica count feeding the formula, after fallback rules.
    pub async fn effective_replica_count(&self) -> u32 {
        if !self.config.dynamic_scaling_enabled {
            return self.config.fallback_replica_count;
        }
        match self.discovery.live_replica_count().await {
            Ok(count) if count > 0 => count,
            Ok(_) => {
                Logger::warn(
                    "capacity.no_live_replicas",
                    &[(
                        "fallback",
                        &self.config.fallback_replica_count.to_string(),
                    )],
                );
                self.config.fallback_replica_count
            }
            Err(err) => {
                Logger::warn(
                    "capacity.discovery_failed",
                    &[
                        ("error", err.to_string().as_str()),
                        (
                            "fallback",
                            self.config.fallback_replica_count.to_string().as_str(),
                        ),
                    ],
                );
                self.config.fallback_replica_count
            }
        }
    }

    /// The static capacity configuration.
    pub fn config(&self) -> &CapacityConfig {
        &self.config
    }
}
