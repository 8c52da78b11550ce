//! Partition ownership: which replica drives which resource's promotion.
//!
//! Every replica evaluates `owns` locally against its own snapshot of the
//! live-replica set. Replicas reading slightly different snapshots can
//! transiently both claim (or neither claim) a resource; promotion is
//! idempotent per member, so that costs duplicate work at worst, never
//! correctness.
//!
//! Hashing is crc32 over the resource/replica identity strings: stable
//! across processes and platforms, which `DefaultHasher` does not
//! guarantee.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::admission::Resource;
use crate::observability::Logger;

use super::tracker::{ReplicaLoadTracker, ReplicaRecord};

/// Ownership strategy, selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStrategy {
    /// Owner = live replica at `hash(resource) % len`, ids sorted
    #[default]
    RoundRobinByHash,
    /// Owner = live replica whose id-hash is numerically closest to
    /// `hash(resource)` (consistent-hashing ring without virtual nodes)
    NearestHash,
    /// Owner = live replica with the lowest reported load, ties by id
    LeastLoaded,
}

impl PartitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionStrategy::RoundRobinByHash => "round_robin_by_hash",
            PartitionStrategy::NearestHash => "nearest_hash",
            PartitionStrategy::LeastLoaded => "least_loaded",
        }
    }
}

/// Per-replica ownership decisions.
pub struct Partitioner {
    tracker: Arc<ReplicaLoadTracker>,
    strategy: PartitionStrategy,
}

impl Partitioner {
    pub fn new(tracker: Arc<ReplicaLoadTracker>, strategy: PartitionStrategy) -> Self {
        Self { tracker, strategy }
    }

    pub fn strategy(&self) -> PartitionStrategy {
        self.strategy
    }

    /// Whether this replica currently owns promotion for `resource`.
    ///
    /// Returns false when the snapshot cannot be read (a replica that
    /// cannot see the cluster must not promote) and when this replica does
    /// not yet appear in its own snapshot (registration race at startup:
    /// do not work on partitions before being externally discoverable).
    pub async fn owns(&self, resource: &Resource) -> bool {
        let snapshot = match self.tracker.live_replicas().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                Logger::warn(
                    "partition.snapshot_failed",
                    &[("error", err.to_string().as_str())],
                );
                return false;
            }
        };
        let self_id = self.tracker.replica_id();
        if !snapshot.iter().any(|r| r.replica_id == self_id) {
            return false;
        }
        match Self::owner_of(&snapshot, resource, self.strategy) {
            Some(owner) => owner == self_id,
            None => false,
        }
    }

    /// The owner a given snapshot assigns to `resource`. Deterministic for
    /// a fixed snapshot, on every replica.
    fn owner_of(
        snapshot: &[ReplicaRecord],
        resource: &Resource,
        strategy: PartitionStrategy,
    ) -> Option<uuid::Uuid> {
        if snapshot.is_empty() {
            return None;
        }
        let resource_hash = crc32fast::hash(resource.to_string().as_bytes());
        match strategy {
            PartitionStrategy::RoundRobinByHash => {
                // Snapshot arrives sorted by id; index by hash.
                let index = (resource_hash as usize) % snapshot.len();
                Some(snapshot[index].replica_id)
            }
            PartitionStrategy::NearestHash => snapshot
                .iter()
                .min_by_key(|record| {
                    let replica_hash =
                        crc32fast::hash(record.replica_id.to_string().as_bytes());
                    let distance =
                        (i64::from(replica_hash) - i64::from(resource_hash)).unsigned_abs();
                    (distance, record.replica_id)
                })
                .map(|record| record.replica_id),
            PartitionStrategy::LeastLoaded => snapshot
                .iter()
                .min_by_key(|record| (record.reported_load, record.replica_id))
                .map(|record| record.replica_id),
        }
    }
}
