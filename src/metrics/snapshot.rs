//! Read-only metrics snapshot and derived health indicators.

use serde::Serialize;

use super::counters::CounterSnapshot;

/// Threshold classification of current utilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemStatus {
    /// Utilization >= 90%
    Overloaded,
    /// Utilization >= 70%
    Busy,
    /// Utilization >= 30%
    Normal,
    /// Anything active below 30%
    Light,
    /// No active members at all
    Idle,
}

impl SystemStatus {
    /// Classify utilization (percent) given the current active count.
    pub fn classify(utilization_rate: f64, active_count: u64) -> Self {
        if active_count == 0 {
            SystemStatus::Idle
        } else if utilization_rate >= 90.0 {
            SystemStatus::Overloaded
        } else if utilization_rate >= 70.0 {
            SystemStatus::Busy
        } else if utilization_rate >= 30.0 {
            SystemStatus::Normal
        } else {
            SystemStatus::Light
        }
    }
}

/// Queue-growth indicator over the last three queue-size samples:
/// `recent > previous >= before_previous`.
pub fn is_queue_growing(samples: &[u64]) -> bool {
    let n = samples.len();
    if n < 3 {
        return false;
    }
    let before_previous = samples[n - 3];
    let previous = samples[n - 2];
    let recent = samples[n - 1];
    recent > previous && previous >= before_previous
}

/// Combined read-only view: counters + histories + derived indicators.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Monotonic operation counters
    pub counters: CounterSnapshot,
    /// Total active members across all resources at the last sample
    pub active_count: u64,
    /// Total waiting members across all resources at the last sample
    pub waiting_count: u64,
    /// Capacity the utilization was derived against
    pub max_sessions: u64,
    /// `active_count / max_sessions * 100`
    pub utilization_rate: f64,
    /// Threshold classification of `utilization_rate`
    pub system_status: SystemStatus,
    /// Whether the queue grew over the last three samples
    pub is_queue_growing: bool,
    /// Rolling queue-size samples, oldest first
    pub queue_size_history: Vec<u64>,
    /// Rolling utilization samples, oldest first
    pub utilization_history: Vec<f64>,
    /// Rolling admissions-per-window samples, oldest first
    pub throughput_history: Vec<u64>,
}
