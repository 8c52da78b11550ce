//! Logical admission state over the shared store.
//!
//! `AdmissionStore` owns the key scheme and the member encoding; every
//! caller (gate, promotion, expiry, metrics) goes through it. Each call
//! maps to one atomic store primitive wrapped in the configured operation
//! timeout, so no caller can stall behind a slow store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::observability::Logger;
use crate::store::{ScoredMember, SharedStore, StoreError, StoreResult};

use super::keys;
use super::member::{Member, Resource};

/// One waiting-queue entry with its arrival score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMember {
    pub member: Member,
    /// Arrival timestamp in milliseconds
    pub score: u64,
}

/// Admission state accessor: active set + waiting queue + expiry markers.
pub struct AdmissionStore {
    store: Arc<dyn SharedStore>,
    op_timeout: Duration,
}

impl AdmissionStore {
    pub fn new(store: Arc<dyn SharedStore>, op_timeout: Duration) -> Self {
        Self { store, op_timeout }
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout { operation }),
        }
    }

    // Active set

    /// Admit a member: add to the active set and write a fresh expiry
    /// marker. The two writes are individually atomic but not joint; a
    /// marker-write failure after a set-write success leaves the member
    /// admitted without a marker, which the sweeper treats as expired on
    /// its next pass.
    pub async fn admit(
        &self,
        resource: &Resource,
        member: &Member,
        session_timeout: Option<Duration>,
    ) -> StoreResult<()> {
        let key = keys::active_set(resource);
        let composite = member.composite_key();
        self.timed("set_add", self.store.set_add(&key, &composite))
            .await?;
        if let Some(ttl) = session_timeout {
            let marker = keys::session_marker(resource, member);
            self.timed("put_with_ttl", self.store.put_with_ttl(&marker, "1", ttl))
                .await?;
        }
        Ok(())
    }

    /// Current active-set size; missing resource reads as 0.
    pub async fn active_size(&self, resource: &Resource) -> StoreResult<u64> {
        let key = keys::active_set(resource);
        self.timed("set_size", self.store.set_size(&key)).await
    }

    /// All active members. Malformed composite keys are logged and skipped,
    /// never aborting the enumeration.
    pub async fn active_members(&self, resource: &Resource) -> StoreResult<Vec<Member>> {
        let key = keys::active_set(resource);
        let raw = self
            .timed("set_members", self.store.set_members(&key))
            .await?;
        let mut members = Vec::with_capacity(raw.len());
        for composite in raw {
            match Member::parse(&composite) {
                Ok(member) => members.push(member),
                Err(err) => {
                    Logger::warn(
                        "admission.malformed_member",
                        &[("key", key.as_str()), ("error", &err.to_string())],
                    );
                }
            }
        }
        Ok(members)
    }

    /// Remove a member from the active set. Returns whether it was present;
    /// the caller that observes `true` owns the follow-up (marker cleanup,
    /// notification), which keeps eviction single-notify across replicas.
    pub async fn remove_active(&self, resource: &Resource, member: &Member) -> StoreResult<bool> {
        let key = keys::active_set(resource);
        let composite = member.composite_key();
        self.timed("set_remove", self.store.set_remove(&key, &composite))
            .await
    }

    /// Whether the member's expiry marker still exists.
    pub async fn marker_alive(&self, resource: &Resource, member: &Member) -> StoreResult<bool> {
        let marker = keys::session_marker(resource, member);
        self.timed("exists", self.store.exists(&marker)).await
    }

    /// Delete the member's expiry marker.
    pub async fn clear_marker(&self, resource: &Resource, member: &Member) -> StoreResult<()> {
        let marker = keys::session_marker(resource, member);
        self.timed("delete", self.store.delete(&marker)).await?;
        Ok(())
    }

    // Waiting queue

    /// Insert a member into the waiting queue with its arrival score.
    pub async fn enqueue(
        &self,
        resource: &Resource,
        member: &Member,
        score_ms: u64,
    ) -> StoreResult<()> {
        let key = keys::waiting_queue(resource);
        let composite = member.composite_key();
        self.timed("zset_add", self.store.zset_add(&key, &composite, score_ms))
            .await?;
        Ok(())
    }

    /// Zero-based queue position, `None` when the member is not waiting.
    pub async fn queue_rank(&self, resource: &Resource, member: &Member) -> StoreResult<Option<u64>> {
        let key = keys::waiting_queue(resource);
        let composite = member.composite_key();
        self.timed("zset_rank", self.store.zset_rank(&key, &composite))
            .await
    }

    /// Waiting-queue length; missing resource reads as 0.
    pub async fn queue_len(&self, resource: &Resource) -> StoreResult<u64> {
        let key = keys::waiting_queue(resource);
        self.timed("zset_card", self.store.zset_card(&key)).await
    }

    /// Remove a member from the waiting queue. Returns whether it was
    /// present.
    pub async fn remove_queued(&self, resource: &Resource, member: &Member) -> StoreResult<bool> {
        let key = keys::waiting_queue(resource);
        let composite = member.composite_key();
        self.timed("zset_remove", self.store.zset_remove(&key, &composite))
            .await
    }

    /// The first `count` waiting members by ascending arrival score,
    /// without removing them.
    ///
    /// Malformed entries are handled differently here than elsewhere:
    /// other readers (such as [`Self::active_members`]) log and skip a
    /// record they cannot parse, but this one deletes it from the queue.
    /// An unparseable entry at the queue front can never be admitted or
    /// notified, and skipping would leave it blocking promotion on every
    /// subsequent tick. Deletion here is deliberate; do not change it to
    /// skip-and-continue.
    pub async fn peek_front(&self, resource: &Resource, count: u64) -> StoreResult<Vec<QueuedMember>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let key = keys::waiting_queue(resource);
        let raw = self
            .timed("zset_range", self.store.zset_range(&key, 0, count - 1))
            .await?;
        let mut front = Vec::with_capacity(raw.len());
        for ScoredMember { member, score } in raw {
            match Member::parse(&member) {
                Ok(parsed) => front.push(QueuedMember {
                    member: parsed,
                    score,
                }),
                Err(err) => {
                    Logger::warn(
                        "admission.malformed_member",
                        &[("key", key.as_str()), ("error", &err.to_string())],
                    );
                    let _ = self
                        .timed("zset_remove", self.store.zset_remove(&key, &member))
                        .await;
                }
            }
        }
        Ok(front)
    }

    /// Waiting members with ranks in `[start, stop]`, paired with their
    /// rank. Used for rank-update fan-out after a promotion batch.
    pub async fn queue_entries(
        &self,
        resource: &Resource,
        start: u64,
        stop: u64,
    ) -> StoreResult<Vec<(Member, u64)>> {
        let key = keys::waiting_queue(resource);
        let raw = self
            .timed("zset_range", self.store.zset_range(&key, start, stop))
            .await?;
        let mut entries = Vec::with_capacity(raw.len());
        for (offset, ScoredMember { member, .. }) in raw.into_iter().enumerate() {
            if let Ok(parsed) = Member::parse(&member) {
                entries.push((parsed, start + offset as u64));
            }
        }
        Ok(entries)
    }

    // Cross-resource enumeration

    /// Every resource with a (possibly empty) active set.
    pub async fn active_resources(&self) -> StoreResult<Vec<Resource>> {
        let raw = self
            .timed("scan", self.store.scan(&keys::active_pattern()))
            .await?;
        Ok(raw
            .iter()
            .filter_map(|key| keys::parse_resource_key(key))
            .collect())
    }

    /// Every resource with a non-empty waiting queue.
    pub async fn queued_resources(&self) -> StoreResult<Vec<Resource>> {
        let raw = self
            .timed("scan", self.store.scan(&keys::waiting_pattern()))
            .await?;
        Ok(raw
            .iter()
            .filter_map(|key| keys::parse_resource_key(key))
            .collect())
    }
}
