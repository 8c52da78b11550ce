//! Promotion cycle implementation.

use std::sync::Arc;
use std::time::Duration;

use crate::admission::store::QueuedMember;
use crate::admission::{AdmissionStore, Resource};
use crate::capacity::CapacityCalculator;
use crate::cluster::Partitioner;
use crate::metrics::MetricsCounters;
use crate::notify::NotificationRelay;
use crate::observability::Logger;
use crate::scheduler::TickError;

/// Periodic promoter for the resources this replica owns.
pub struct PromotionLoop {
    admission: Arc<AdmissionStore>,
    calculator: Arc<CapacityCalculator>,
    partitioner: Arc<Partitioner>,
    relay: Arc<NotificationRelay>,
    counters: Arc<MetricsCounters>,
    session_timeout: Option<Duration>,
}

impl PromotionLoop {
    pub fn new(
        admission: Arc<AdmissionStore>,
        calculator: Arc<CapacityCalculator>,
        partitioner: Arc<Partitioner>,
        relay: Arc<NotificationRelay>,
        counters: Arc<MetricsCounters>,
        session_timeout: Option<Duration>,
    ) -> Self {
        Self {
            admission,
            calculator,
            partitioner,
            relay,
            counters,
            session_timeout,
        }
    }

    /// One promotion tick: visit every owned resource with a non-empty
    /// waiting queue. Per-resource failures are logged and never abort the
    /// cycle for the remaining resources.
    pub async fn run_cycle(&self) -> Result<(), TickError> {
        let resources = match self.admission.queued_resources().await {
            Ok(resources) => resources,
            Err(err) => {
                Logger::warn(
                    "promotion.scan_failed",
                    &[("error", err.to_string().as_str())],
                );
                return Ok(());
            }
        };

        for resource in resources {
            if !self.partitioner.owns(&resource).await {
                continue;
            }
            self.promote_resource(&resource).await;
        }
        Ok(())
    }

    /// Promote up to `vacant` members for one resource, front of the queue
    /// first, with per-member failure isolation.
    async fn promote_resource(&self, resource: &Resource) {
        let capacity = self.calculator.max_active().await;
        let active = match self.admission.active_size(resource).await {
            Ok(active) => active,
            Err(err) => {
                Logger::warn(
                    "promotion.active_size_failed",
                    &[
                        ("resource", resource.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                return;
            }
        };
        let vacant = capacity.saturating_sub(active);
        if vacant == 0 {
            return;
        }

        let front = match self.admission.peek_front(resource, vacant).await {
            Ok(front) => front,
            Err(err) => {
                Logger::warn(
                    "promotion.peek_failed",
                    &[
                        ("resource", resource.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                return;
            }
        };
        if front.is_empty() {
            return;
        }

        let mut promoted: Vec<QueuedMember> = Vec::with_capacity(front.len());
        for queued in front {
            // A member that fails here stays in the queue for the next
            // cycle; the rest of the batch continues.
            if let Err(err) = self
                .admission
                .admit(resource, &queued.member, self.session_timeout)
                .await
            {
                Logger::warn(
                    "promotion.admit_failed",
                    &[
                        ("member", queued.member.to_string().as_str()),
                        ("resource", resource.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                self.relay
                    .notify_error(resource, &queued.member.request_id, "promotion failed, retrying")
                    .await;
                continue;
            }
            // If this removal fails the member is transiently in both
            // structures; the next cycle re-admits (set add is idempotent)
            // and retries the removal.
            if let Err(err) = self
                .admission
                .remove_queued(resource, &queued.member)
                .await
            {
                Logger::error(
                    "promotion.dequeue_failed",
                    &[
                        ("member", queued.member.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                continue;
            }
            self.counters.record_admission();
            promoted.push(queued);
        }

        if promoted.is_empty() {
            return;
        }
        self.counters.record_batch_promotion();
        Logger::info(
            "promotion.batch",
            &[
                ("count", promoted.len().to_string().as_str()),
                ("resource", resource.to_string().as_str()),
            ],
        );

        for queued in &promoted {
            self.relay
                .notify_admitted(resource, &queued.member.request_id)
                .await;
        }
        self.fan_out_queue_state(resource).await;
    }

    /// Stats broadcast plus a rank update to every remaining waiter.
    async fn fan_out_queue_state(&self, resource: &Resource) {
        let total_waiting = self.admission.queue_len(resource).await.unwrap_or(0);
        self.relay.broadcast_stats(resource, total_waiting).await;
        if total_waiting == 0 {
            return;
        }
        let entries = self
            .admission
            .queue_entries(resource, 0, total_waiting - 1)
            .await
            .unwrap_or_default();
        for (member, rank) in entries {
            self.relay
                .notify_rank_update(resource, &member.request_id, rank, total_waiting)
                .await;
        }
    }
}
