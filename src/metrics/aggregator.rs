//! Periodic sampling and snapshot assembly.

use std::sync::{Arc, RwLock};

use crate::admission::AdmissionStore;
use crate::capacity::CapacityCalculator;
use crate::observability::Logger;
use crate::scheduler::TickError;

use super::counters::MetricsCounters;
use super::history::RingHistory;
use super::snapshot::{is_queue_growing, MetricsSnapshot, SystemStatus};

#[derive(Debug, Default)]
struct Sampled {
    queue_sizes: RingHistory<u64>,
    utilization: RingHistory<f64>,
    throughput: RingHistory<u64>,
    last_active: u64,
    last_waiting: u64,
    last_capacity: u64,
}

/// Samples admission state into rolling histories and serves read-only
/// snapshots. Two independent tick bodies feed it: usage sampling (10 s
/// reference) and throughput sampling (60 s reference).
pub struct MetricsAggregator {
    admission: Arc<AdmissionStore>,
    calculator: Arc<CapacityCalculator>,
    counters: Arc<MetricsCounters>,
    sampled: RwLock<Sampled>,
}

impl MetricsAggregator {
    pub fn new(
        admission: Arc<AdmissionStore>,
        calculator: Arc<CapacityCalculator>,
        counters: Arc<MetricsCounters>,
    ) -> Self {
        Self {
            admission,
            calculator,
            counters,
            sampled: RwLock::new(Sampled::default()),
        }
    }

    /// Usage tick: total active/waiting across all resources plus derived
    /// utilization. Per-resource read failures degrade that resource to
    /// zero rather than skipping the sample.
    pub async fn sample_usage(&self) -> Result<(), TickError> {
        let mut active_total: u64 = 0;
        let mut waiting_total: u64 = 0;

        match self.admission.active_resources().await {
            Ok(resources) => {
                for resource in resources {
                    active_total += self.admission.active_size(&resource).await.unwrap_or(0);
                }
            }
            Err(err) => {
                Logger::warn(
                    "metrics.active_scan_failed",
                    &[("error", err.to_string().as_str())],
                );
            }
        }
        match self.admission.queued_resources().await {
            Ok(resources) => {
                for resource in resources {
                    waiting_total += self.admission.queue_len(&resource).await.unwrap_or(0);
                }
            }
            Err(err) => {
                Logger::warn(
                    "metrics.waiting_scan_failed",
                    &[("error", err.to_string().as_str())],
                );
            }
        }

        let capacity = self.calculator.max_active().await;
        let utilization = if capacity > 0 {
            active_total as f64 / capacity as f64 * 100.0
        } else {
            0.0
        };

        let mut sampled = self
            .sampled
            .write()
            .map_err(|_| -> TickError { "metrics state poisoned".into() })?;
        sampled.queue_sizes.push(waiting_total);
        sampled.utilization.push(utilization);
        sampled.last_active = active_total;
        sampled.last_waiting = waiting_total;
        sampled.last_capacity = capacity;
        Ok(())
    }

    /// Throughput tick: swap the admissions-since-last-sample window into
    /// its history.
    pub async fn sample_throughput(&self) -> Result<(), TickError> {
        let window = self.counters.take_throughput_window();
        let mut sampled = self
            .sampled
            .write()
            .map_err(|_| -> TickError { "metrics state poisoned".into() })?;
        sampled.throughput.push(window);
        Ok(())
    }

    /// Current read-only snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let (queue_history, utilization_history, throughput_history, active, waiting, capacity) =
            match self.sampled.read() {
                Ok(sampled) => (
                    sampled.queue_sizes.samples(),
                    sampled.utilization.samples(),
                    sampled.throughput.samples(),
                    sampled.last_active,
                    sampled.last_waiting,
                    sampled.last_capacity,
                ),
                Err(_) => (Vec::new(), Vec::new(), Vec::new(), 0, 0, 0),
            };

        let utilization_rate = utilization_history.last().copied().unwrap_or(0.0);
        MetricsSnapshot {
            counters: self.counters.snapshot(),
            active_count: active,
            waiting_count: waiting,
            max_sessions: capacity,
            utilization_rate,
            system_status: SystemStatus::classify(utilization_rate, active),
            is_queue_growing: is_queue_growing(&queue_history),
            queue_size_history: queue_history,
            utilization_history,
            throughput_history,
        }
    }
}
