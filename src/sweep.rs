//! Expiration Sweeper
//!
//! Actively reaps entries whose last read is older than the TTL, replica by
//! replica. The sweep is externally scheduled; nothing in the crate runs a
//! timer. Each replica is swept independently inside one atomic batch, so
//! its cache entries and recency records disappear together. There is no
//! coordination across replicas; a replica that fails is logged and left
//! for the next sweep.
//!
//! Reaping a key the backend TTL already removed is a benign no-op.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::cache::entry_key;
use crate::domain::outcome::FanoutReport;
use crate::domain::ports::{Clock, KeyValueStore, ScoreRange, StoreBatch};
use crate::error::Result;
use crate::recency::RecencyIndex;
use crate::registry::ReplicaRegistry;

/// Reaps stale entries using the recency index.
pub struct ExpirationSweeper {
    namespace: String,
    ttl: Duration,
    recency: RecencyIndex,
    clock: Arc<dyn Clock>,
}

impl ExpirationSweeper {
    pub fn new(namespace: impl Into<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let namespace = namespace.into();
        let recency = RecencyIndex::new(&namespace);
        Self {
            namespace,
            ttl,
            recency,
            clock,
        }
    }

    /// Sweep every replica in the registry.
    ///
    /// The cutoff (`now − ttl`) is computed once per call; members last
    /// read at or before it are eligible. Per-replica failures are recorded
    /// in the report and the loop continues.
    #[instrument(skip(self, registry), fields(namespace = %self.namespace))]
    pub async fn purge_expired(&self, registry: &ReplicaRegistry) -> FanoutReport {
        let cutoff = self.clock.now_unix() - self.ttl.as_secs() as i64;
        let mut report = FanoutReport::new();

        for replica in registry.iter() {
            let result = self.sweep_replica(replica.store(), cutoff).await;
            match &result {
                Ok(reaped) => {
                    debug!(host = %replica.host(), reaped, "swept replica");
                }
                Err(error) => {
                    warn!(host = %replica.host(), %error, "replica sweep failed");
                }
            }
            report.record(replica.host(), result.map(|_| ()));
        }

        report
    }

    async fn sweep_replica(&self, store: &dyn KeyValueStore, cutoff: i64) -> Result<usize> {
        let stale = self.recency.stale_members(store, cutoff).await?;
        if stale.is_empty() {
            return Ok(0);
        }

        let mut batch = StoreBatch::new();
        for member in &stale {
            batch.delete(entry_key(&self.namespace, member));
        }
        batch.remove_range_by_score(self.recency.key(), ScoreRange::at_most(cutoff));
        store.execute_atomic(batch).await?;

        Ok(stale.len())
    }
}

impl std::fmt::Debug for ExpirationSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationSweeper")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryStore, ManualClock};
    use crate::registry::Replica;
    use bytes::Bytes;

    fn sweeper_fixture() -> (ExpirationSweeper, ReplicaRegistry, Arc<InMemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(10_000));
        let store = InMemoryStore::new("mem-0", clock.clone());
        let registry =
            ReplicaRegistry::from_replicas(vec![Replica::new("mem-0", store.clone() as _)]);
        let sweeper =
            ExpirationSweeper::new("app:", Duration::from_secs(100), clock.clone() as _);
        (sweeper, registry, store, clock)
    }

    #[tokio::test]
    async fn test_sweep_is_noop_before_cutoff() {
        let (sweeper, registry, store, _clock) = sweeper_fixture();

        store.set("app:k", Bytes::from("v")).await.unwrap();
        store.sorted_add("app:_lru", "k", 10_000).await.unwrap();

        let report = sweeper.purge_expired(&registry).await;
        assert!(report.is_complete());
        assert!(store.contains_entry("app:k"));
        assert_eq!(store.score_of("app:_lru", "k"), Some(10_000));
    }

    #[tokio::test]
    async fn test_sweep_reaps_entry_and_record_together() {
        let (sweeper, registry, store, clock) = sweeper_fixture();

        store.set("app:k", Bytes::from("v")).await.unwrap();
        store.sorted_add("app:_lru", "k", 10_000).await.unwrap();

        clock.advance(100);
        let report = sweeper.purge_expired(&registry).await;

        assert!(report.is_complete());
        assert!(!store.contains_entry("app:k"));
        assert_eq!(store.score_of("app:_lru", "k"), None);
    }

    #[tokio::test]
    async fn test_sweep_failure_is_reported_not_raised() {
        let (sweeper, registry, store, clock) = sweeper_fixture();

        store.sorted_add("app:_lru", "k", 10_000).await.unwrap();
        clock.advance(200);
        store.set_offline(true);

        let report = sweeper.purge_expired(&registry).await;
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failed_hosts().collect::<Vec<_>>(), vec!["mem-0"]);
    }
}
