//! Recency Index
//!
//! Per-replica sorted structure mapping each cache key to the Unix time it
//! was last read, stored under `namespace + "_lru"`. Ordering by timestamp
//! is what lets the sweeper ask for "everything older than the cutoff" as a
//! single range query.
//!
//! The index is written on read hits only. A key that is set but never read
//! has no record here and can only expire through the backend-native TTL.

use crate::domain::ports::{KeyValueStore, ScoreRange};
use crate::error::Result;

/// Suffix appended to the namespace to name the index structure.
const INDEX_SUFFIX: &str = "_lru";

/// Handle on the recency structure of one cache namespace.
#[derive(Debug, Clone)]
pub struct RecencyIndex {
    key: String,
}

impl RecencyIndex {
    pub fn new(namespace: &str) -> Self {
        Self {
            key: format!("{namespace}{INDEX_SUFFIX}"),
        }
    }

    /// The backend key the index lives under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Record that `member` was read at `now` on one replica.
    pub async fn touch(&self, store: &dyn KeyValueStore, member: &str, now: i64) -> Result<()> {
        store.sorted_add(&self.key, member, now).await
    }

    /// Members last read at or before `cutoff` on one replica.
    pub async fn stale_members(
        &self,
        store: &dyn KeyValueStore,
        cutoff: i64,
    ) -> Result<Vec<String>> {
        store.sorted_range(&self.key, ScoreRange::at_most(cutoff)).await
    }

    /// Total number of tracked members on one replica.
    pub async fn len(&self, store: &dyn KeyValueStore) -> Result<u64> {
        store.sorted_count(&self.key, ScoreRange::all()).await
    }
}
