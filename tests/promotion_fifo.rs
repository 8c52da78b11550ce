//! Promotion ordering and isolation tests.
//!
//! 1. FIFO: a member that joins first is promoted no later than one that
//!    joins after it
//! 2. Leave-then-promote: a freed slot is filled by the queue front within
//!    one cycle, with an Admitted notification
//! 3. Partial batch failure: one member's store error never blocks the
//!    rest of the batch
//! 4. Capacity scales with replica count

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use turnstile::admission::{AdmissionGate, AdmissionStore, EnterOutcome, Member, Resource};
use turnstile::capacity::{CapacityCalculator, DiscoveryResult, ReplicaDiscovery};
use turnstile::cluster::{PartitionStrategy, Partitioner, ReplicaLoadTracker};
use turnstile::config::CapacityConfig;
use turnstile::metrics::MetricsCounters;
use turnstile::notify::{BroadcastSink, NotificationRelay, PublishedMessage};
use turnstile::promotion::PromotionLoop;
use turnstile::store::{MemoryStore, ScoredMember, SharedStore, StoreError, StoreResult};
use uuid::Uuid;

struct FixedReplicas(u32);

#[async_trait]
impl ReplicaDiscovery for FixedReplicas {
    async fn live_replica_count(&self) -> DiscoveryResult<u32> {
        Ok(self.0)
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Store wrapper that refuses to admit one specific member.
struct FlakyStore {
    inner: MemoryStore,
    poisoned_member: String,
}

#[async_trait]
impl SharedStore for FlakyStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        if member == self.poisoned_member {
            return Err(StoreError::Unavailable("injected".into()));
        }
        self.inner.set_add(key, member).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.inner.set_remove(key, member).await
    }

    async fn set_size(&self, key: &str) -> StoreResult<u64> {
        self.inner.set_size(key).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.inner.set_members(key).await
    }

    async fn zset_add(&self, key: &str, member: &str, score: u64) -> StoreResult<bool> {
        self.inner.zset_add(key, member, score).await
    }

    async fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.inner.zset_remove(key, member).await
    }

    async fn zset_rank(&self, key: &str, member: &str) -> StoreResult<Option<u64>> {
        self.inner.zset_rank(key, member).await
    }

    async fn zset_range(&self, key: &str, start: u64, stop: u64) -> StoreResult<Vec<ScoredMember>> {
        self.inner.zset_range(key, start, stop).await
    }

    async fn zset_card(&self, key: &str) -> StoreResult<u64> {
        self.inner.zset_card(key).await
    }

    async fn zset_pop_min(&self, key: &str, count: u64) -> StoreResult<Vec<ScoredMember>> {
        self.inner.zset_pop_min(key, count).await
    }

    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.inner.put_with_ttl(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.inner.delete(key).await
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.inner.scan(pattern).await
    }
}

struct Harness {
    admission: Arc<AdmissionStore>,
    gate: AdmissionGate,
    promotion: PromotionLoop,
    sink: Arc<BroadcastSink>,
}

async fn harness_on(store: Arc<dyn SharedStore>, capacity_per_replica: u64) -> Harness {
    let admission = Arc::new(AdmissionStore::new(
        store.clone(),
        Duration::from_millis(800),
    ));
    let calculator = Arc::new(CapacityCalculator::new(
        CapacityConfig {
            base_units_per_replica: capacity_per_replica,
            max_global_limit: 500,
            dynamic_scaling_enabled: true,
            fallback_replica_count: 1,
        },
        Arc::new(FixedReplicas(1)),
    ));
    let tracker = Arc::new(ReplicaLoadTracker::new(
        store,
        Uuid::new_v4(),
        Duration::from_secs(300),
    ));
    tracker.heartbeat().await.unwrap();
    let partitioner = Arc::new(Partitioner::new(
        tracker,
        PartitionStrategy::RoundRobinByHash,
    ));
    let counters = Arc::new(MetricsCounters::new());
    let sink = Arc::new(BroadcastSink::new(128));
    let relay = Arc::new(NotificationRelay::new(sink.clone(), None, counters.clone()));
    let gate = AdmissionGate::new(
        admission.clone(),
        calculator.clone(),
        counters.clone(),
        Some(Duration::from_secs(300)),
    );
    let promotion = PromotionLoop::new(
        admission.clone(),
        calculator,
        partitioner,
        relay,
        counters,
        Some(Duration::from_secs(300)),
    );
    Harness {
        admission,
        gate,
        promotion,
        sink,
    }
}

async fn harness(capacity: u64) -> Harness {
    harness_on(Arc::new(MemoryStore::new()), capacity).await
}

fn member(id: &str) -> Member {
    Member::new(id, "sess")
}

async fn drain_topics(rx: &mut tokio::sync::broadcast::Receiver<PublishedMessage>) -> Vec<String> {
    let mut topics = Vec::new();
    while let Ok(message) = rx.try_recv() {
        topics.push(message.topic);
    }
    topics
}

#[tokio::test]
async fn earlier_arrivals_promote_no_later_than_later_ones() {
    let h = harness(1).await;
    let resource = Resource::new("movie", "1");

    // Occupy the single slot, then queue three members in order.
    h.gate.try_enter(&resource, &member("holder")).await.unwrap();
    for id in ["a", "b", "c"] {
        assert!(matches!(
            h.gate.try_enter(&resource, &member(id)).await.unwrap(),
            EnterOutcome::Queued { .. }
        ));
        // Distinct arrival millis keep scores strictly ordered.
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let mut promoted_order = Vec::new();
    for _ in 0..3 {
        let front = h.admission.peek_front(&resource, 1).await.unwrap();
        let active = h.admission.active_members(&resource).await.unwrap();
        h.gate.leave(&resource, &active[0]).await.unwrap();
        h.promotion.run_cycle().await.unwrap();
        promoted_order.push(front[0].member.request_id.clone());
    }

    assert_eq!(promoted_order, vec!["a", "b", "c"]);
    assert_eq!(h.admission.queue_len(&resource).await.unwrap(), 0);
}

#[tokio::test]
async fn freed_slot_is_filled_by_queue_front_within_one_cycle() {
    let h = harness(2).await;
    let mut rx = h.sink.subscribe();
    let resource = Resource::new("movie", "1");

    let m1 = member("m1");
    assert_eq!(
        h.gate.try_enter(&resource, &m1).await.unwrap(),
        EnterOutcome::Admitted
    );
    assert_eq!(
        h.gate.try_enter(&resource, &member("m2")).await.unwrap(),
        EnterOutcome::Admitted
    );
    assert_eq!(
        h.gate.try_enter(&resource, &member("m3")).await.unwrap(),
        EnterOutcome::Queued {
            rank: 0,
            total_waiting: 1
        }
    );

    h.gate.leave(&resource, &m1).await.unwrap();
    h.promotion.run_cycle().await.unwrap();

    // m3 is now active, the queue is empty, and m3 was notified.
    let active = h.admission.active_members(&resource).await.unwrap();
    assert!(active.iter().any(|m| m.request_id == "m3"));
    assert_eq!(h.admission.queue_len(&resource).await.unwrap(), 0);
    let topics = drain_topics(&mut rx).await;
    assert!(topics.contains(&"admission/movie/m3/admitted".to_string()));
}

#[tokio::test]
async fn one_failing_member_does_not_block_the_batch() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        poisoned_member: "bad:sess".to_string(),
    });
    let h = harness_on(store, 5).await;
    let resource = Resource::new("movie", "1");

    for (i, id) in ["ok1", "bad", "ok2"].iter().enumerate() {
        h.admission
            .enqueue(&resource, &member(id), 1_000 + i as u64)
            .await
            .unwrap();
    }

    h.promotion.run_cycle().await.unwrap();

    // Both healthy members were promoted past the failing one.
    let active = h.admission.active_members(&resource).await.unwrap();
    let mut ids: Vec<&str> = active.iter().map(|m| m.request_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["ok1", "ok2"]);
    // The failed member stays queued for the next cycle.
    assert_eq!(
        h.admission.queue_rank(&resource, &member("bad")).await.unwrap(),
        Some(0)
    );
}

#[tokio::test]
async fn capacity_doubles_with_replica_count() {
    let config = CapacityConfig {
        base_units_per_replica: 50,
        max_global_limit: 500,
        dynamic_scaling_enabled: true,
        fallback_replica_count: 1,
    };
    let two = CapacityCalculator::new(config.clone(), Arc::new(FixedReplicas(2)));
    let four = CapacityCalculator::new(config.clone(), Arc::new(FixedReplicas(4)));
    assert_eq!(two.max_active().await * 2, four.max_active().await);

    // Still clamped by the global limit.
    let many = CapacityCalculator::new(config, Arc::new(FixedReplicas(64)));
    assert_eq!(many.max_active().await, 500);
}
