//! In-Memory Backend Adapter
//!
//! A `KeyValueStore` test double backing replication tests without a live
//! Redis. Models the backend behaviors the cache core depends on: native
//! TTL (lazily enforced against the injected clock), the sorted-set
//! primitive, per-store atomic batches, and a fault switch that makes every
//! operation fail the way an unreachable replica does.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::domain::ports::{BatchOp, Clock, KeyValueStore, ScoreRange, StoreBatch};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    /// Unix deadline after which the entry is gone, if a TTL was applied
    expires_at: Option<i64>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    // member -> score, per sorted structure
    sets: HashMap<String, BTreeMap<String, i64>>,
}

impl Inner {
    fn prune_expired(&mut self, key: &str, now: i64) {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at.is_some_and(|deadline| deadline <= now) {
                self.entries.remove(key);
            }
        }
    }

    fn apply(&mut self, op: &BatchOp) {
        match op {
            BatchOp::Delete(key) => {
                self.entries.remove(key);
            }
            BatchOp::RemoveRangeByScore { set, range } => {
                if let Some(members) = self.sets.get_mut(set) {
                    members.retain(|_, score| !range.contains(*score));
                }
            }
        }
    }
}

/// In-memory replica for tests.
pub struct InMemoryStore {
    host: String,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new(host: impl Into<String>, clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            host: host.into(),
            clock,
            offline: AtomicBool::new(false),
            inner: RwLock::new(Inner::default()),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Simulate a network partition: while offline, every operation fails
    /// with [`Error::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw score for `member` in the sorted structure at `set`.
    pub fn score_of(&self, set: &str, member: &str) -> Option<i64> {
        self.inner.read().sets.get(set).and_then(|m| m.get(member)).copied()
    }

    /// Whether a live (non-expired) entry exists at `key`.
    pub fn contains_entry(&self, key: &str) -> bool {
        let now = self.clock.now_unix();
        self.inner
            .read()
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at.map_or(true, |deadline| deadline > now))
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Unavailable(self.host.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("host", &self.host)
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.check_online()?;
        let now = self.clock.now_unix();
        let mut inner = self.inner.write();
        inner.prune_expired(key, now);
        Ok(inner.entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.check_online()?;
        self.inner.write().entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.check_online()?;
        let deadline = self.clock.now_unix() + ttl.as_secs() as i64;
        if let Some(entry) = self.inner.write().entries.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_online()?;
        self.inner.write().entries.remove(key);
        Ok(())
    }

    async fn sorted_add(&self, set: &str, member: &str, score: i64) -> Result<()> {
        self.check_online()?;
        self.inner
            .write()
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn sorted_range(&self, set: &str, range: ScoreRange) -> Result<Vec<String>> {
        self.check_online()?;
        let inner = self.inner.read();
        let Some(members) = inner.sets.get(set) else {
            return Ok(Vec::new());
        };
        let mut matched: Vec<(&String, i64)> = members
            .iter()
            .filter(|(_, score)| range.contains(**score))
            .map(|(member, score)| (member, *score))
            .collect();
        // score-ascending, the backend's range ordering
        matched.sort_by_key(|(_, score)| *score);
        Ok(matched.into_iter().map(|(member, _)| member.clone()).collect())
    }

    async fn sorted_remove_range(&self, set: &str, range: ScoreRange) -> Result<()> {
        self.check_online()?;
        if let Some(members) = self.inner.write().sets.get_mut(set) {
            members.retain(|_, score| !range.contains(*score));
        }
        Ok(())
    }

    async fn sorted_count(&self, set: &str, range: ScoreRange) -> Result<u64> {
        self.check_online()?;
        let inner = self.inner.read();
        Ok(inner
            .sets
            .get(set)
            .map(|members| members.values().filter(|score| range.contains(**score)).count() as u64)
            .unwrap_or(0))
    }

    async fn execute_atomic(&self, batch: StoreBatch) -> Result<()> {
        self.check_online()?;
        // one write guard for the whole batch: all-or-nothing per store
        let mut inner = self.inner.write();
        for op in batch.ops() {
            inner.apply(op);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use assert_matches::assert_matches;

    fn store_with_clock() -> (Arc<InMemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let store = InMemoryStore::new("mem-0", clock.clone());
        (store, clock)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (store, _clock) = store_with_clock();

        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", Bytes::from("v")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(Bytes::from("v")));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_native_ttl_enforced_by_clock() {
        let (store, clock) = store_with_clock();

        store.set("k", Bytes::from("v")).await.unwrap();
        store.expire("k", Duration::from_secs(10)).await.unwrap();

        clock.advance(9);
        assert!(store.get("k").await.unwrap().is_some());

        clock.advance(1);
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.contains_entry("k"));
    }

    #[tokio::test]
    async fn test_set_without_expire_never_dies() {
        let (store, clock) = store_with_clock();

        store.set("k", Bytes::from("v")).await.unwrap();
        clock.advance(1_000_000);
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sorted_set_operations() {
        let (store, _clock) = store_with_clock();

        store.sorted_add("lru", "a", 10).await.unwrap();
        store.sorted_add("lru", "b", 20).await.unwrap();
        store.sorted_add("lru", "c", 30).await.unwrap();
        // re-adding updates the score in place
        store.sorted_add("lru", "a", 25).await.unwrap();

        let stale = store.sorted_range("lru", ScoreRange::at_most(25)).await.unwrap();
        assert_eq!(stale, vec!["b".to_string(), "a".to_string()]);

        assert_eq!(store.sorted_count("lru", ScoreRange::all()).await.unwrap(), 3);

        store.sorted_remove_range("lru", ScoreRange::at_most(25)).await.unwrap();
        assert_eq!(store.sorted_count("lru", ScoreRange::all()).await.unwrap(), 1);
        assert_eq!(store.score_of("lru", "c"), Some(30));
    }

    #[tokio::test]
    async fn test_atomic_batch() {
        let (store, _clock) = store_with_clock();

        store.set("app:a", Bytes::from("1")).await.unwrap();
        store.set("app:b", Bytes::from("2")).await.unwrap();
        store.sorted_add("app:_lru", "a", 10).await.unwrap();
        store.sorted_add("app:_lru", "b", 50).await.unwrap();

        let mut batch = StoreBatch::new();
        batch
            .delete("app:a")
            .remove_range_by_score("app:_lru", ScoreRange::at_most(20));
        store.execute_atomic(batch).await.unwrap();

        assert!(!store.contains_entry("app:a"));
        assert!(store.contains_entry("app:b"));
        assert_eq!(store.score_of("app:_lru", "a"), None);
        assert_eq!(store.score_of("app:_lru", "b"), Some(50));
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_operation() {
        let (store, _clock) = store_with_clock();
        store.set("k", Bytes::from("v")).await.unwrap();

        store.set_offline(true);
        assert_matches!(store.get("k").await, Err(Error::Unavailable(_)));
        assert_matches!(store.set("k", Bytes::from("x")).await, Err(Error::Unavailable(_)));
        assert_matches!(store.execute_atomic(StoreBatch::new()).await, Err(Error::Unavailable(_)));

        store.set_offline(false);
        assert_eq!(store.get("k").await.unwrap(), Some(Bytes::from("v")));
    }
}
