//! Expiry sweep implementation.

use std::sync::Arc;

use crate::admission::{AdmissionStore, Resource};
use crate::metrics::MetricsCounters;
use crate::notify::NotificationRelay;
use crate::observability::Logger;
use crate::scheduler::TickError;

/// Periodic eviction of timed-out active members.
///
/// Sweeps every resource it can enumerate, so resources created by other
/// replicas are covered without registration. Disabled entirely when no
/// session timeout is configured.
pub struct ExpirySweeper {
    admission: Arc<AdmissionStore>,
    relay: Arc<NotificationRelay>,
    counters: Arc<MetricsCounters>,
    enabled: bool,
}

impl ExpirySweeper {
    pub fn new(
        admission: Arc<AdmissionStore>,
        relay: Arc<NotificationRelay>,
        counters: Arc<MetricsCounters>,
        enabled: bool,
    ) -> Self {
        Self {
            admission,
            relay,
            counters,
            enabled,
        }
    }

    /// One sweep tick across all resources. Per-resource and per-member
    /// failures are logged and never abort the rest of the sweep.
    pub async fn run_cycle(&self) -> Result<(), TickError> {
        if !self.enabled {
            return Ok(());
        }
        let resources = match self.admission.active_resources().await {
            Ok(resources) => resources,
            Err(err) => {
                Logger::warn(
                    "expiry.scan_failed",
                    &[("error", err.to_string().as_str())],
                );
                return Ok(());
            }
        };
        for resource in resources {
            self.sweep_resource(&resource).await;
        }
        Ok(())
    }

    async fn sweep_resource(&self, resource: &Resource) {
        let members = match self.admission.active_members(resource).await {
            Ok(members) => members,
            Err(err) => {
                Logger::warn(
                    "expiry.members_failed",
                    &[
                        ("resource", resource.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                return;
            }
        };

        for member in members {
            let alive = match self.admission.marker_alive(resource, &member).await {
                Ok(alive) => alive,
                // An unreadable marker is not proof of expiry; leave the
                // member for the next sweep rather than evict on a store
                // hiccup.
                Err(_) => continue,
            };
            if alive {
                continue;
            }
            match self.admission.remove_active(resource, &member).await {
                // Only the replica whose removal returned true notifies,
                // so a concurrently sweeping replica cannot double-send.
                Ok(true) => {
                    self.counters.record_timeout();
                    Logger::info(
                        "expiry.evicted",
                        &[
                            ("member", member.to_string().as_str()),
                            ("resource", resource.to_string().as_str()),
                        ],
                    );
                    self.relay
                        .notify_timeout(resource, &member.request_id)
                        .await;
                }
                Ok(false) => {}
                Err(err) => {
                    Logger::warn(
                        "expiry.evict_failed",
                        &[
                            ("member", member.to_string().as_str()),
                            ("error", err.to_string().as_str()),
                        ],
                    );
                }
            }
        }
    }
}
