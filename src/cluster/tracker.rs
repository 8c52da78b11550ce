//! Replica heartbeat records and liveness.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admission::keys;
use crate::capacity::{DiscoveryError, DiscoveryResult, ReplicaDiscovery};
use crate::observability::Logger;
use crate::store::{SharedStore, StoreResult};

/// One replica's self-reported state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaRecord {
    pub replica_id: Uuid,
    pub last_heartbeat: DateTime<Utc>,
    /// Self-reported load, used by the least-loaded partition strategy
    pub reported_load: u32,
}

/// Tracks this replica's heartbeat and reads the live-replica snapshot.
///
/// Records live in the shared store with a TTL equal to the liveness
/// window; a replica that stops heartbeating disappears from partitioning
/// after the window even if its record key lingers, because the timestamp
/// check is applied on read as well.
pub struct ReplicaLoadTracker {
    store: Arc<dyn SharedStore>,
    replica_id: Uuid,
    liveness_window: Duration,
    current_load: AtomicU32,
}

impl ReplicaLoadTracker {
    pub fn new(store: Arc<dyn SharedStore>, replica_id: Uuid, liveness_window: Duration) -> Self {
        Self {
            store,
            replica_id,
            liveness_window,
            current_load: AtomicU32::new(0),
        }
    }

    /// This replica's identity.
    pub fn replica_id(&self) -> Uuid {
        self.replica_id
    }

    /// Update the load figure the next heartbeat will report.
    pub fn set_load(&self, load: u32) {
        self.current_load.store(load, Ordering::Relaxed);
    }

    /// Write this replica's record. Called on startup and then every
    /// heartbeat interval.
    pub async fn heartbeat(&self) -> StoreResult<()> {
        let record = ReplicaRecord {
            replica_id: self.replica_id,
            last_heartbeat: Utc::now(),
            reported_load: self.current_load.load(Ordering::Relaxed),
        };
        let encoded = serde_json::to_string(&record)
            .map_err(|err| crate::store::StoreError::Internal(err.to_string()))?;
        let key = keys::replica_record(&self.replica_id.to_string());
        self.store
            .put_with_ttl(&key, &encoded, self.liveness_window)
            .await
    }

    /// Snapshot of every replica whose heartbeat is within the liveness
    /// window, sorted by replica id so every caller sees the same order.
    /// Unparseable records are logged and skipped.
    pub async fn live_replicas(&self) -> StoreResult<Vec<ReplicaRecord>> {
        let keys_found = self.store.scan(&keys::replica_pattern()).await?;
        let horizon = Utc::now()
            - chrono::Duration::from_std(self.liveness_window)
                .unwrap_or_else(|_| chrono::Duration::seconds(300));

        let mut records = Vec::with_capacity(keys_found.len());
        for key in keys_found {
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<ReplicaRecord>(&raw) {
                Ok(record) if record.last_heartbeat >= horizon => records.push(record),
                Ok(_) => {}
                Err(err) => {
                    Logger::warn(
                        "cluster.bad_replica_record",
                        &[("key", key.as_str()), ("error", err.to_string().as_str())],
                    );
                }
            }
        }
        records.sort_by_key(|r| r.replica_id);
        Ok(records)
    }

    /// Remove this replica's record, for graceful shutdown.
    pub async fn deregister(&self) -> StoreResult<()> {
        let key = keys::replica_record(&self.replica_id.to_string());
        self.store.delete(&key).await?;
        Ok(())
    }
}

#[async_trait]
impl ReplicaDiscovery for ReplicaLoadTracker {
    async fn live_replica_count(&self) -> DiscoveryResult<u32> {
        let records = self
            .live_replicas()
            .await
            .map_err(DiscoveryError::from)?;
        Ok(records.len() as u32)
    }

    async fn is_available(&self) -> bool {
        self.store.scan(&keys::replica_pattern()).await.is_ok()
    }
}
