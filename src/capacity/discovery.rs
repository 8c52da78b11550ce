//! Replica discovery contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::store::StoreError;

/// Result type for discovery calls.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Discovery errors.
///
/// A failed check must surface as an error, never as a silent zero: zero
/// live replicas is a legitimate answer, an unreachable discovery service
/// is not.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// The discovery backend could not be reached
    #[error("Replica discovery unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DiscoveryError {
    fn from(err: StoreError) -> Self {
        DiscoveryError::Unavailable(err.to_string())
    }
}

/// Source of the live replica count.
#[async_trait]
pub trait ReplicaDiscovery: Send + Sync + 'static {
    /// Number of currently live replicas. `Ok(0)` means the check worked
    /// and found none; backend failure is `Err`.
    async fn live_replica_count(&self) -> DiscoveryResult<u32>;

    /// Whether the discovery backend is currently reachable.
    async fn is_available(&self) -> bool;
}
