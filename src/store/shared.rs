//! The `SharedStore` contract.
//!
//! Each method maps to one atomic operation on the backing service. The
//! trait is object-safe so components hold `Arc<dyn SharedStore>` and tests
//! can substitute failure-injecting fakes.

use std::time::Duration;

use async_trait::async_trait;

use super::errors::StoreResult;

/// One entry of a score-ordered collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredMember {
    /// Opaque member key
    pub member: String,
    /// Ordering score (arrival timestamp in ms for waiting queues)
    pub score: u64,
}

/// Atomic primitives offered by the shared key-value service.
///
/// Ordering guarantee required of implementations: within one sorted set,
/// equal scores preserve insertion order on every read (tie-break must be
/// stable across re-reads).
#[async_trait]
pub trait SharedStore: Send + Sync + 'static {
    // Unordered sets

    /// Add a member to a set. Returns true when the member was newly added.
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Remove a member from a set. Returns true when the member was present.
    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Cardinality of a set; missing key reads as 0.
    async fn set_size(&self, key: &str) -> StoreResult<u64>;

    /// All members of a set; missing key reads as empty.
    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    // Score-ordered collections

    /// Insert a member with a score, or update the score of an existing
    /// member. Returns true when the member was newly inserted.
    async fn zset_add(&self, key: &str, member: &str, score: u64) -> StoreResult<bool>;

    /// Remove a member. Returns true when the member was present.
    async fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Zero-based rank by ascending score, `None` when absent.
    async fn zset_rank(&self, key: &str, member: &str) -> StoreResult<Option<u64>>;

    /// Members with ranks in `[start, stop]` inclusive, ascending score.
    async fn zset_range(&self, key: &str, start: u64, stop: u64) -> StoreResult<Vec<ScoredMember>>;

    /// Cardinality; missing key reads as 0.
    async fn zset_card(&self, key: &str) -> StoreResult<u64>;

    /// Atomically remove and return up to `count` lowest-scored members.
    async fn zset_pop_min(&self, key: &str, count: u64) -> StoreResult<Vec<ScoredMember>>;

    // Plain keys with TTL (expiry markers, replica records)

    /// Set a key to a value that disappears after `ttl`.
    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Read a key, `None` when absent or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Whether the key currently exists (TTL not elapsed).
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Delete a key. Returns true when it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    // Namespace enumeration

    /// Keys matching a glob-style pattern (`*` wildcard only). May be
    /// eventually consistent; used for cross-resource sweeps, never for
    /// per-request decisions.
    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
