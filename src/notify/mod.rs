//! # Notifications
//!
//! Best-effort event fan-out to the transport layer. Delivery failures are
//! logged and counted, never raised to a promotion or sweep cycle. A
//! secondary store-backed event log propagates admission events to replicas
//! whose transport clients are attached elsewhere.

pub mod errors;
pub mod event;
pub mod event_log;
pub mod relay;
pub mod sink;

pub use errors::{NotifyError, NotifyResult};
pub use event::{
    AdmissionEvent, AdmittedPayload, ErrorPayload, EventKind, EventStatus, QueueStatsPayload,
    RankUpdatePayload, TimeoutPayload,
};
pub use event_log::AdmissionEventLog;
pub use relay::NotificationRelay;
pub use sink::{BroadcastSink, NotificationSink, PublishedMessage};
