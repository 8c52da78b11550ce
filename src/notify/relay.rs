//! The notification relay.
//!
//! Fire-and-forget from the caller's perspective: a failed delivery is a
//! log line and a counter bump, never an error return. The relay also
//! mirrors member-addressed events into the cross-replica event log.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::admission::Resource;
use crate::metrics::MetricsCounters;
use crate::observability::Logger;

use super::event::{
    member_topic, resource_topic, AdmissionEvent, AdmittedPayload, ErrorPayload, EventKind,
    QueueStatsPayload, RankUpdatePayload, TimeoutPayload,
};
use super::event_log::AdmissionEventLog;
use super::sink::NotificationSink;

/// Best-effort event fan-out to the transport and the event log.
pub struct NotificationRelay {
    sink: Arc<dyn NotificationSink>,
    event_log: Option<Arc<AdmissionEventLog>>,
    counters: Arc<MetricsCounters>,
}

impl NotificationRelay {
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        event_log: Option<Arc<AdmissionEventLog>>,
        counters: Arc<MetricsCounters>,
    ) -> Self {
        Self {
            sink,
            event_log,
            counters,
        }
    }

    /// Member was promoted into the active set.
    pub async fn notify_admitted(&self, resource: &Resource, request_id: &str) {
        let topic = member_topic(&resource.resource_type, request_id, EventKind::Admitted);
        self.deliver(
            &topic,
            EventKind::Admitted,
            resource,
            Some(request_id),
            &AdmittedPayload::now(),
        )
        .await;
    }

    /// Member's queue position changed.
    pub async fn notify_rank_update(
        &self,
        resource: &Resource,
        request_id: &str,
        rank: u64,
        total_waiting: u64,
    ) {
        let topic = member_topic(&resource.resource_type, request_id, EventKind::RankUpdate);
        self.deliver(
            &topic,
            EventKind::RankUpdate,
            resource,
            Some(request_id),
            &RankUpdatePayload::now(rank, total_waiting),
        )
        .await;
    }

    /// Member's session expired and was evicted.
    pub async fn notify_timeout(&self, resource: &Resource, request_id: &str) {
        let topic = member_topic(&resource.resource_type, request_id, EventKind::Timeout);
        self.deliver(
            &topic,
            EventKind::Timeout,
            resource,
            Some(request_id),
            &TimeoutPayload::now(),
        )
        .await;
    }

    /// Resource-wide queue statistics after a promotion batch.
    pub async fn broadcast_stats(&self, resource: &Resource, total_waiting: u64) {
        let topic = resource_topic(resource, EventKind::QueueStats);
        self.deliver(
            &topic,
            EventKind::QueueStats,
            resource,
            None,
            &QueueStatsPayload::now(total_waiting),
        )
        .await;
    }

    /// Error report addressed to one member.
    pub async fn notify_error(&self, resource: &Resource, request_id: &str, message: &str) {
        let topic = member_topic(&resource.resource_type, request_id, EventKind::Error);
        self.deliver(
            &topic,
            EventKind::Error,
            resource,
            Some(request_id),
            &ErrorPayload::now(message),
        )
        .await;
    }

    async fn deliver<P: Serialize>(
        &self,
        topic: &str,
        kind: EventKind,
        resource: &Resource,
        request_id: Option<&str>,
        payload: &P,
    ) {
        let value: Value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                self.counters.record_notification_failure();
                Logger::error(
                    "notify.encode_failed",
                    &[("topic", topic), ("error", err.to_string().as_str())],
                );
                return;
            }
        };

        match self.sink.publish(topic, value.clone()).await {
            Ok(()) => self.counters.record_notification_sent(),
            Err(err) => {
                self.counters.record_notification_failure();
                Logger::warn(
                    "notify.publish_failed",
                    &[("topic", topic), ("error", err.to_string().as_str())],
                );
            }
        }

        if let Some(log) = &self.event_log {
            let event = AdmissionEvent::new(
                kind,
                resource.clone(),
                request_id.map(str::to_string),
                value,
            );
            log.append(&event).await;
        }
    }
}
