//! In-memory reference implementation of `SharedStore`.
//!
//! Single-process stand-in for the external shared service. Each trait
//! method takes one lock for its whole body, which gives the same atomicity
//! the external service guarantees per operation. TTL keys expire lazily on
//! read.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
// tokio's Instant so TTL expiry follows virtual time in paused-clock tests.
use tokio::time::Instant;

use super::errors::{StoreError, StoreResult};
use super::shared::{ScoredMember, SharedStore};

#[derive(Debug, Clone)]
struct ZEntry {
    member: String,
    score: u64,
    // Insertion sequence, the tie-break for equal scores. Never reordered
    // on re-read.
    seq: u64,
}

#[derive(Debug, Default)]
struct ZSet {
    entries: Vec<ZEntry>,
    next_seq: u64,
}

impl ZSet {
    fn position(&self, member: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.member == member)
    }

    fn insert_sorted(&mut self, entry: ZEntry) {
        let at = self
            .entries
            .iter()
            .position(|e| (e.score, e.seq) > (entry.score, entry.seq))
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
    }
}

#[derive(Debug)]
struct TtlValue {
    value: String,
    deadline: Instant,
}

/// In-memory `SharedStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: RwLock<HashMap<String, HashSet<String>>>,
    zsets: RwLock<HashMap<String, ZSet>>,
    keys: RwLock<HashMap<String, TtlValue>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Internal("lock poisoned".into())
    }

    /// Glob match supporting `*` only.
    fn glob_match(pattern: &str, key: &str) -> bool {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 1 {
            return pattern == key;
        }
        let mut rest = key;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                match rest.strip_prefix(part) {
                    Some(r) => rest = r,
                    None => return false,
                }
            } else if i == parts.len() - 1 {
                return rest.ends_with(part);
            } else {
                match rest.find(part) {
                    Some(at) => rest = &rest[at + part.len()..],
                    None => return false,
                }
            }
        }
        // Pattern ended with '*'
        true
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut sets = self.sets.write().map_err(|_| Self::poisoned())?;
        Ok(sets.entry(key.to_string()).or_default().insert(member.to_string()))
    }

    async fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut sets = self.sets.write().map_err(|_| Self::poisoned())?;
        let removed = sets.get_mut(key).map(|s| s.remove(member)).unwrap_or(false);
        if removed {
            if let Some(s) = sets.get(key) {
                if s.is_empty() {
                    sets.remove(key);
                }
            }
        }
        Ok(removed)
    }

    async fn set_size(&self, key: &str) -> StoreResult<u64> {
        let sets = self.sets.read().map_err(|_| Self::poisoned())?;
        Ok(sets.get(key).map(|s| s.len() as u64).unwrap_or(0))
    }

    async fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        let sets = self.sets.read().map_err(|_| Self::poisoned())?;
        Ok(sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn zset_add(&self, key: &str, member: &str, score: u64) -> StoreResult<bool> {
        let mut zsets = self.zsets.write().map_err(|_| Self::poisoned())?;
        let zset = zsets.entry(key.to_string()).or_default();
        let seq = zset.next_seq;
        zset.next_seq += 1;
        match zset.position(member) {
            Some(at) => {
                let mut entry = zset.entries.remove(at);
                entry.score = score;
                entry.seq = seq;
                zset.insert_sorted(entry);
                Ok(false)
            }
            None => {
                zset.insert_sorted(ZEntry {
                    member: member.to_string(),
                    score,
                    seq,
                });
                Ok(true)
            }
        }
    }

    async fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut zsets = self.zsets.write().map_err(|_| Self::poisoned())?;
        let removed = match zsets.get_mut(key) {
            Some(zset) => match zset.position(member) {
                Some(at) => {
                    zset.entries.remove(at);
                    true
                }
                None => false,
            },
            None => false,
        };
        if removed {
            if let Some(zset) = zsets.get(key) {
                if zset.entries.is_empty() {
                    zsets.remove(key);
                }
            }
        }
        Ok(removed)
    }

    async fn zset_rank(&self, key: &str, member: &str) -> StoreResult<Option<u64>> {
        let zsets = self.zsets.read().map_err(|_| Self::poisoned())?;
        Ok(zsets
            .get(key)
            .and_then(|z| z.position(member))
            .map(|at| at as u64))
    }

    async fn zset_range(&self, key: &str, start: u64, stop: u64) -> StoreResult<Vec<ScoredMember>> {
        let zsets = self.zsets.read().map_err(|_| Self::poisoned())?;
        let Some(zset) = zsets.get(key) else {
            return Ok(Vec::new());
        };
        let start = start as usize;
        if start >= zset.entries.len() {
            return Ok(Vec::new());
        }
        let stop = (stop as usize).min(zset.entries.len().saturating_sub(1));
        if stop < start {
            return Ok(Vec::new());
        }
        Ok(zset.entries[start..=stop]
            .iter()
            .map(|e| ScoredMember {
                member: e.member.clone(),
                score: e.score,
            })
            .collect())
    }

    async fn zset_card(&self, key: &str) -> StoreResult<u64> {
        let zsets = self.zsets.read().map_err(|_| Self::poisoned())?;
        Ok(zsets.get(key).map(|z| z.entries.len() as u64).unwrap_or(0))
    }

    async fn zset_pop_min(&self, key: &str, count: u64) -> StoreResult<Vec<ScoredMember>> {
        let mut zsets = self.zsets.write().map_err(|_| Self::poisoned())?;
        let Some(zset) = zsets.get_mut(key) else {
            return Ok(Vec::new());
        };
        let take = (count as usize).min(zset.entries.len());
        let popped: Vec<ScoredMember> = zset
            .entries
            .drain(..take)
            .map(|e| ScoredMember {
                member: e.member,
                score: e.score,
            })
            .collect();
        if zset.entries.is_empty() {
            zsets.remove(key);
        }
        Ok(popped)
    }

    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let mut keys = self.keys.write().map_err(|_| Self::poisoned())?;
        keys.insert(
            key.to_string(),
            TtlValue {
                value: value.to_string(),
                deadline: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut keys = self.keys.write().map_err(|_| Self::poisoned())?;
        match keys.get(key) {
            Some(v) if v.deadline > Instant::now() => Ok(Some(v.value.clone())),
            Some(_) => {
                keys.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut keys = self.keys.write().map_err(|_| Self::poisoned())?;
        Ok(keys.remove(key).is_some())
    }

    async fn scan(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let mut matched: Vec<String> = Vec::new();
        {
            let sets = self.sets.read().map_err(|_| Self::poisoned())?;
            matched.extend(sets.keys().filter(|k| Self::glob_match(pattern, k)).cloned());
        }
        {
            let zsets = self.zsets.read().map_err(|_| Self::poisoned())?;
            matched.extend(zsets.keys().filter(|k| Self::glob_match(pattern, k)).cloned());
        }
        {
            let keys = self.keys.read().map_err(|_| Self::poisoned())?;
            matched.extend(
                keys.iter()
                    .filter(|(k, v)| v.deadline > now && Self::glob_match(pattern, k))
                    .map(|(k, _)| k.clone()),
            );
        }
        matched.sort();
        matched.dedup();
        Ok(matched)
    }
}
