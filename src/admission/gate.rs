//! The synchronous admission decision point.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::capacity::CapacityCalculator;
use crate::metrics::MetricsCounters;
use crate::observability::Logger;

use super::errors::AdmissionResult;
use super::member::{Member, Resource};
use super::store::AdmissionStore;

/// Outcome of a `try_enter` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterOutcome {
    /// Member is in the active set with a fresh session
    Admitted,
    /// Member joined the waiting queue
    Queued { rank: u64, total_waiting: u64 },
}

/// Admit-or-enqueue gate.
///
/// The size check and the subsequent insert are two separate atomic store
/// operations, not one transaction. Concurrent racing requests can
/// transiently push the active set past capacity by at most the number of
/// racers; the next promotion cycle observes vacancy <= 0 and admits
/// nothing until the overshoot drains.
pub struct AdmissionGate {
    admission: Arc<AdmissionStore>,
    calculator: Arc<CapacityCalculator>,
    counters: Arc<MetricsCounters>,
    session_timeout: Option<Duration>,
}

impl AdmissionGate {
    pub fn new(
        admission: Arc<AdmissionStore>,
        calculator: Arc<CapacityCalculator>,
        counters: Arc<MetricsCounters>,
        session_timeout: Option<Duration>,
    ) -> Self {
        Self {
            admission,
            calculator,
            counters,
            session_timeout,
        }
    }

    /// Admit immediately when capacity allows, otherwise enqueue.
    pub async fn try_enter(
        &self,
        resource: &Resource,
        member: &Member,
    ) -> AdmissionResult<EnterOutcome> {
        let capacity = self.calculator.max_active().await;
        // A failed size read degrades to zero, never to "unlimited": the
        // worst case is a transient over-admission, bounded like the race
        // above.
        let active = match self.admission.active_size(resource).await {
            Ok(active) => active,
            Err(err) => {
                Logger::warn(
                    "gate.active_size_failed",
                    &[
                        ("resource", resource.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
                0
            }
        };

        if active < capacity {
            self.admission
                .admit(resource, member, self.session_timeout)
                .await?;
            self.counters.record_admission();
            Logger::info(
                "gate.admitted",
                &[
                    ("member", member.to_string().as_str()),
                    ("resource", resource.to_string().as_str()),
                ],
            );
            return Ok(EnterOutcome::Admitted);
        }

        let score = Utc::now().timestamp_millis().max(0) as u64;
        self.admission.enqueue(resource, member, score).await?;
        self.counters.record_queue_join();

        // Rank/length reads after the insert are informational; degrade on
        // failure instead of failing an enqueue that already happened.
        let rank = self
            .admission
            .queue_rank(resource, member)
            .await
            .ok()
            .flatten()
            .unwrap_or(0);
        let total_waiting = self
            .admission
            .queue_len(resource)
            .await
            .unwrap_or(rank + 1);
        Logger::info(
            "gate.queued",
            &[
                ("member", member.to_string().as_str()),
                ("rank", rank.to_string().as_str()),
                ("resource", resource.to_string().as_str()),
            ],
        );
        Ok(EnterOutcome::Queued {
            rank,
            total_waiting,
        })
    }

    /// Remove a member from whichever structure holds it, active set
    /// checked first. Idempotent; absent members are a successful no-op.
    pub async fn leave(&self, resource: &Resource, member: &Member) -> AdmissionResult<()> {
        if self.admission.remove_active(resource, member).await? {
            if let Err(err) = self.admission.clear_marker(resource, member).await {
                Logger::warn(
                    "gate.marker_cleanup_failed",
                    &[
                        ("member", member.to_string().as_str()),
                        ("error", err.to_string().as_str()),
                    ],
                );
            }
            return Ok(());
        }
        self.admission.remove_queued(resource, member).await?;
        Ok(())
    }
}
