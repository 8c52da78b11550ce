//! Typed notification events and topic addressing.
//!
//! Payloads are explicit serde structs per event kind so a field rename is
//! a compile error, not a silently different wire shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::admission::Resource;

/// Kind of admission event, the last topic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Admitted,
    RankUpdate,
    Timeout,
    QueueStats,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Admitted => "admitted",
            EventKind::RankUpdate => "rank_update",
            EventKind::Timeout => "timeout",
            EventKind::QueueStats => "queue_stats",
            EventKind::Error => "error",
        }
    }
}

/// Member-visible status carried in every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Admitted,
    Waiting,
    Timeout,
    Stats,
    Error,
}

/// Topic for a member-addressed event:
/// `admission/{resource_type}/{request_id}/{kind}`.
pub fn member_topic(resource_type: &str, request_id: &str, kind: EventKind) -> String {
    format!("admission/{}/{}/{}", resource_type, request_id, kind.as_str())
}

/// Topic for a resource-wide event:
/// `admission/{resource_type}/{resource_id}/{kind}`.
pub fn resource_topic(resource: &Resource, kind: EventKind) -> String {
    format!(
        "admission/{}/{}/{}",
        resource.resource_type,
        resource.resource_id,
        kind.as_str()
    )
}

/// Payload for `admitted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmittedPayload {
    pub status: EventStatus,
    pub timestamp: DateTime<Utc>,
}

impl AdmittedPayload {
    pub fn now() -> Self {
        Self {
            status: EventStatus::Admitted,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `rank_update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankUpdatePayload {
    pub status: EventStatus,
    /// Zero-based queue position
    pub rank: u64,
    pub total_waiting: u64,
    pub timestamp: DateTime<Utc>,
}

impl RankUpdatePayload {
    pub fn now(rank: u64, total_waiting: u64) -> Self {
        Self {
            status: EventStatus::Waiting,
            rank,
            total_waiting,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `timeout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutPayload {
    pub status: EventStatus,
    pub timestamp: DateTime<Utc>,
}

impl TimeoutPayload {
    pub fn now() -> Self {
        Self {
            status: EventStatus::Timeout,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `queue_stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatsPayload {
    pub status: EventStatus,
    pub total_waiting: u64,
    pub timestamp: DateTime<Utc>,
}

impl QueueStatsPayload {
    pub fn now(total_waiting: u64) -> Self {
        Self {
            status: EventStatus::Stats,
            total_waiting,
            timestamp: Utc::now(),
        }
    }
}

/// Payload for `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub status: EventStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorPayload {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            status: EventStatus::Error,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Envelope written to the cross-replica event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionEvent {
    /// Unique event id (uniqueness keeps log entries distinct under equal
    /// timestamps)
    pub event_id: uuid::Uuid,
    pub kind: EventKind,
    pub resource: Resource,
    /// Addressed request id; `None` for resource-wide events
    pub request_id: Option<String>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AdmissionEvent {
    pub fn new(
        kind: EventKind,
        resource: Resource,
        request_id: Option<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            kind,
            resource,
            request_id,
            payload,
            timestamp: Utc::now(),
        }
    }
}
