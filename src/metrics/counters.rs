//! Monotonic operation counters.
//!
//! Thread-safe, lock-free, Relaxed ordering; eventual consistency is fine
//! for metrics. Exposed only through value snapshots, never as mutable
//! references.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counter registry for the admission subsystem.
///
/// `throughput_window` is the one non-monotonic value: it accumulates
/// admissions since the last throughput sample and is swapped to zero by
/// the sampler.
#[derive(Debug, Default)]
pub struct MetricsCounters {
    admissions_processed: AtomicU64,
    timeouts: AtomicU64,
    queue_joins: AtomicU64,
    batch_promotions: AtomicU64,
    notifications_sent: AtomicU64,
    notification_failures: AtomicU64,
    throughput_window: AtomicU64,
}

impl MetricsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// One member admitted, whether directly at the gate or by promotion.
    pub fn record_admission(&self) {
        self.admissions_processed.fetch_add(1, Ordering::Relaxed);
        self.throughput_window.fetch_add(1, Ordering::Relaxed);
    }

    /// One active member evicted by the expiry sweep.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// One member entered the waiting queue.
    pub fn record_queue_join(&self) {
        self.queue_joins.fetch_add(1, Ordering::Relaxed);
    }

    /// One promotion batch completed with at least one member promoted.
    pub fn record_batch_promotion(&self) {
        self.batch_promotions.fetch_add(1, Ordering::Relaxed);
    }

    /// One notification handed to the transport.
    pub fn record_notification_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// One notification the transport failed to take.
    pub fn record_notification_failure(&self) {
        self.notification_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Admissions since the last throughput sample, resetting the window.
    pub fn take_throughput_window(&self) -> u64 {
        self.throughput_window.swap(0, Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            admissions_processed: self.admissions_processed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            queue_joins: self.queue_joins.load(Ordering::Relaxed),
            batch_promotions: self.batch_promotions.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable counter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub admissions_processed: u64,
    pub timeouts: u64,
    pub queue_joins: u64,
    pub batch_promotions: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let counters = MetricsCounters::new();
        counters.record_admission();
        counters.record_admission();
        counters.record_queue_join();

        let snap = counters.snapshot();
        assert_eq!(snap.admissions_processed, 2);
        assert_eq!(snap.queue_joins, 1);
        assert_eq!(snap.timeouts, 0);
    }

    #[test]
    fn throughput_window_resets_on_take() {
        let counters = MetricsCounters::new();
        counters.record_admission();
        counters.record_admission();
        assert_eq!(counters.take_throughput_window(), 2);
        assert_eq!(counters.take_throughput_window(), 0);
        // The monotonic counter is unaffected by the reset.
        assert_eq!(counters.snapshot().admissions_processed, 2);
    }
}
