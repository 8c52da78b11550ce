//! Expiry sweep tests over the full gate-to-sweeper wiring, using the
//! paused tokio clock to fast-forward past the session timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use turnstile::admission::{AdmissionGate, AdmissionStore, EnterOutcome, Member, Resource};
use turnstile::capacity::{CapacityCalculator, DiscoveryResult, ReplicaDiscovery};
use turnstile::config::CapacityConfig;
use turnstile::expiry::ExpirySweeper;
use turnstile::metrics::MetricsCounters;
use turnstile::notify::{BroadcastSink, NotificationRelay};
use turnstile::store::MemoryStore;

struct OneReplica;

#[async_trait]
impl ReplicaDiscovery for OneReplica {
    async fn live_replica_count(&self) -> DiscoveryResult<u32> {
        Ok(1)
    }

    async fn is_available(&self) -> bool {
        true
    }
}

struct Harness {
    admission: Arc<AdmissionStore>,
    gate: AdmissionGate,
    sweeper: ExpirySweeper,
    sink: Arc<BroadcastSink>,
    counters: Arc<MetricsCounters>,
}

fn harness(session_timeout: Duration) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let admission = Arc::new(AdmissionStore::new(store, Duration::from_millis(800)));
    let calculator = Arc::new(CapacityCalculator::new(
        CapacityConfig {
            base_units_per_replica: 10,
            max_global_limit: 10,
            dynamic_scaling_enabled: true,
            fallback_replica_count: 1,
        },
        Arc::new(OneReplica),
    ));
    let counters = Arc::new(MetricsCounters::new());
    let sink = Arc::new(BroadcastSink::new(64));
    let relay = Arc::new(NotificationRelay::new(sink.clone(), None, counters.clone()));
    let gate = AdmissionGate::new(
        admission.clone(),
        calculator,
        counters.clone(),
        Some(session_timeout),
    );
    let sweeper = ExpirySweeper::new(admission.clone(), relay, counters.clone(), true);
    Harness {
        admission,
        gate,
        sweeper,
        sink,
        counters,
    }
}

#[tokio::test(start_paused = true)]
async fn timed_out_member_is_evicted_with_one_notification() {
    let h = harness(Duration::from_secs(1));
    let mut rx = h.sink.subscribe();
    let resource = Resource::new("movie", "1");
    let m1 = Member::new("m1", "sess");

    assert_eq!(
        h.gate.try_enter(&resource, &m1).await.unwrap(),
        EnterOutcome::Admitted
    );

    // Two sweep cycles elapse past the timeout.
    tokio::time::advance(Duration::from_secs(2)).await;
    h.sweeper.run_cycle().await.unwrap();
    h.sweeper.run_cycle().await.unwrap();

    assert_eq!(h.admission.active_size(&resource).await.unwrap(), 0);
    assert_eq!(h.counters.snapshot().timeouts, 1);

    let message = rx.recv().await.unwrap();
    assert_eq!(message.topic, "admission/movie/m1/timeout");
    assert_eq!(message.payload["status"], "TIMEOUT");
    assert!(rx.try_recv().is_err(), "exactly one timeout notification");
}

#[tokio::test(start_paused = true)]
async fn leave_before_timeout_prevents_eviction_notice() {
    let h = harness(Duration::from_secs(60));
    let mut rx = h.sink.subscribe();
    let resource = Resource::new("movie", "1");
    let m1 = Member::new("m1", "sess");

    h.gate.try_enter(&resource, &m1).await.unwrap();
    h.gate.leave(&resource, &m1).await.unwrap();

    tokio::time::advance(Duration::from_secs(120)).await;
    h.sweeper.run_cycle().await.unwrap();

    assert_eq!(h.counters.snapshot().timeouts, 0);
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn sweep_covers_multiple_resources() {
    let h = harness(Duration::from_secs(1));
    let showing_a = Resource::new("movie", "a");
    let showing_b = Resource::new("movie", "b");

    h.gate
        .try_enter(&showing_a, &Member::new("ra", "s"))
        .await
        .unwrap();
    h.gate
        .try_enter(&showing_b, &Member::new("rb", "s"))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;
    h.sweeper.run_cycle().await.unwrap();

    assert_eq!(h.admission.active_size(&showing_a).await.unwrap(), 0);
    assert_eq!(h.admission.active_size(&showing_b).await.unwrap(), 0);
    assert_eq!(h.counters.snapshot().timeouts, 2);
}
