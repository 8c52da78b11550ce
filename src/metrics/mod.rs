//! # Metrics
//!
//! Process-wide counters, bounded rolling histories, and the periodic
//! sampler that combines them into a read-only snapshot with derived
//! health indicators. Counters only increase and reset only on process
//! start; histories evict oldest on overflow.

pub mod aggregator;
pub mod counters;
pub mod history;
pub mod snapshot;

pub use aggregator::MetricsAggregator;
pub use counters::{CounterSnapshot, MetricsCounters};
pub use history::RingHistory;
pub use snapshot::{is_queue_growing, MetricsSnapshot, SystemStatus};
