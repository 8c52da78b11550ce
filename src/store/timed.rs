//! Operation-timeout decorator for any `SharedStore`.
//!
//! Wraps every trait method in the configured timeout so no caller can
//! stall behind a slow backend, whichever component issues the call. An
//! elapsed timeout surfaces as [`StoreError::Timeout`] carrying the
//! operation name.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::errors::{StoreError, StoreResult};
use super::shared::{ScoredMember, SharedStore};

/// `SharedStore` wrapper that bounds the latency of every operation.
pub struct TimedStore {
    inner: Arc<dyn SharedStore>,
    op_timeout: Duration,
}

impl TimedStore {
    pub fn new(inner: Arc<dyn SharedStore>, op_timeout: Duration) -> Self {
        Self { inner, op_timeout }
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
}

#[async_trait]
impl SharedStore for TimedStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.timed("set_add", self.inner.set_add(key, member)).await
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.timed("set_remove", self.inner.set_remove(key, member))
            .await
    }

    async fn set_size(&self, key: &str) -> StoreResult<u64> {
        self.timed("set_size", self.inner.set_size(key)).await
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.timed("set_members", self.inner.set_members(key)).await
    }

    async fn zset_add(&self, key: &str, member: &str, score: u64) -> StoreResult<bool> {
        self.timed("zset_add", self.inner.zset_add(key, member, score))
            .await
    }

    async fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.timed("zset_remove", self.inner.zset_remove(key, member))
            .await
    }

    async fn zset_rank(&self, key: &str, member: &str) -> StoreResult<Option<u64>> {
        self.timed("zset_rank", self.inner.zset_rank(key, member))
            .await
    }

    async fn zset_range(&self, key: &str, start: u64, stop: u64) -> StoreResult<Vec<ScoredMember>> {
        self.timed("zset_range", self.inner.zset_range(key, start, stop))
            .await
    }

    async fn zset_card(&self, key: &str) -> StoreResult<u64> {
        self.timed("zset_card", self.inner.zset_card(key)).await
    }

    async fn zset_pop_min(&self, key: &str, count: u64) -> StoreResult<Vec<ScoredMember>> {
        self.timed("zset_pop_min", self.inner.zset_pop_min(key, count))
            .await
    }

    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        self.timed("put_with_ttl", self.inner.put_with_ttl(key, value, ttl))
            .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.timed("get", self.inner.get(key)).await
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.timed("exists", self.inner.exists(key)).await
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        self.timed("delete", self.inner.delete(key)).await
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        self.timed("scan", self.inner.scan(pattern)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn passes_healthy_operations_through() {
        let store = TimedStore::new(Arc::new(MemoryStore::new()), Duration::from_millis(800));
        assert!(store.set_add("s", "a").await.unwrap());
        assert_eq!(store.set_size("s").await.unwrap(), 1);
        store.zset_add("q", "a", 1).await.unwrap();
        assert_eq!(store.zset_rank("q", "a").await.unwrap(), Some(0));
        assert_eq!(store.scan("*").await.unwrap().len(), 2);
    }
}
