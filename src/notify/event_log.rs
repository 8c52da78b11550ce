//! Store-backed admission event log.
//!
//! The secondary, out-of-process channel: admission events are appended to
//! a score-ordered collection on the shared store so that an event produced
//! by one replica's promotion loop is observable by every replica's
//! transport clients. Readers poll `recent`; the log is bounded and the
//! oldest entries are trimmed on append.

use std::sync::Arc;

use crate::admission::keys;
use crate::observability::Logger;
use crate::store::{SharedStore, StoreResult};

use super::event::AdmissionEvent;

/// Maximum retained events before append-side trimming.
const MAX_LOG_ENTRIES: u64 = 1_000;

/// Bounded cross-replica event log.
pub struct AdmissionEventLog {
    store: Arc<dyn SharedStore>,
    key: String,
}

impl AdmissionEventLog {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            store,
            key: keys::event_log(),
        }
    }

    /// Append an event, scored by its timestamp in milliseconds. Best
    /// effort: serialization or store failures are logged and dropped.
    pub async fn append(&self, event: &AdmissionEvent) {
        let encoded = match serde_json::to_string(event) {
            Ok(encoded) => encoded,
            Err(err) => {
                Logger::error(
                    "event_log.encode_failed",
                    &[("error", err.to_string().as_str())],
                );
                return;
            }
        };
        let score = event.timestamp.timestamp_millis().max(0) as u64;
        if let Err(err) = self.store.zset_add(&self.key, &encoded, score).await {
            Logger::warn(
                "event_log.append_failed",
                &[("error", err.to_string().as_str())],
            );
            return;
        }
        self.trim().await;
    }

    async fn trim(&self) {
        let len = match self.store.zset_card(&self.key).await {
            Ok(len) => len,
            Err(_) => return,
        };
        if len > MAX_LOG_ENTRIES {
            let _ = self.store.zset_pop_min(&self.key, len - MAX_LOG_ENTRIES).await;
        }
    }

    /// Most recent `limit` events, oldest first. Entries that fail to
    /// decode (written by a newer replica version) are skipped.
    pub async fn recent(&self, limit: u64) -> StoreResult<Vec<AdmissionEvent>> {
        let len = self.store.zset_card(&self.key).await?;
        let start = len.saturating_sub(limit);
        let raw = self
            .store
            .zset_range(&self.key, start, len.saturating_sub(1))
            .await?;
        Ok(raw
            .iter()
            .filter_map(|entry| serde_json::from_str(&entry.member).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::Resource;
    use crate::notify::event::EventKind;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn event(kind: EventKind, request_id: &str) -> AdmissionEvent {
        AdmissionEvent::new(
            kind,
            Resource::new("movie", "1"),
            Some(request_id.to_string()),
            json!({"status": "ADMITTED"}),
        )
    }

    #[tokio::test]
    async fn append_then_read_back() {
        let log = AdmissionEventLog::new(Arc::new(MemoryStore::new()));
        log.append(&event(EventKind::Admitted, "r1")).await;
        log.append(&event(EventKind::Timeout, "r2")).await;

        let events = log.recent(10).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].request_id.as_deref(), Some("r1"));
        assert_eq!(events[1].kind, EventKind::Timeout);
    }

    #[tokio::test]
    async fn recent_limits_from_the_tail() {
        let log = AdmissionEventLog::new(Arc::new(MemoryStore::new()));
        for i in 0..5 {
            log.append(&event(EventKind::Admitted, &format!("r{}", i))).await;
        }
        let events = log.recent(2).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].request_id.as_deref(), Some("r4"));
    }
}
