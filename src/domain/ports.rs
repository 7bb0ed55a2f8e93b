//! Domain Ports (Port/Adapter Pattern)
//!
//! This module defines the abstractions the cache core depends on.
//! Infrastructure adapters implement these traits to provide concrete
//! backends.
//!
//! The cache never talks to a backend directly: every replica is reached
//! through [`KeyValueStore`], and every timestamp comes from [`Clock`].
//! The production adapters live in [`crate::adapters`]; tests substitute
//! an in-memory store and a manual clock.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

// =============================================================================
// Value Objects
// =============================================================================

/// Inclusive score range over a sorted structure.
///
/// `None` bounds are unbounded (`-inf` / `+inf` on the wire). All staleness
/// queries use [`ScoreRange::at_most`] with the sweep cutoff; the size probe
/// uses [`ScoreRange::all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl ScoreRange {
    /// The unbounded range.
    pub fn all() -> Self {
        Self { min: None, max: None }
    }

    /// Everything with score less than or equal to `max`.
    pub fn at_most(max: i64) -> Self {
        Self { min: None, max: Some(max) }
    }

    /// Check whether a score falls inside this range.
    pub fn contains(&self, score: i64) -> bool {
        self.min.map_or(true, |min| score >= min) && self.max.map_or(true, |max| score <= max)
    }
}

// =============================================================================
// Batched Execution
// =============================================================================

/// A single operation queued into a [`StoreBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Delete a plain key
    Delete(String),
    /// Remove a score range from a sorted structure
    RemoveRangeByScore { set: String, range: ScoreRange },
}

/// A batch of operations executed atomically against one store.
///
/// Atomicity is scoped to the single connection the batch runs on; nothing
/// coordinates batches across replicas.
#[derive(Debug, Clone, Default)]
pub struct StoreBatch {
    ops: Vec<BatchOp>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a key deletion.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Delete(key.into()));
        self
    }

    /// Queue removal of a score range from a sorted structure.
    pub fn remove_range_by_score(&mut self, set: impl Into<String>, range: ScoreRange) -> &mut Self {
        self.ops.push(BatchOp::RemoveRangeByScore { set: set.into(), range });
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// =============================================================================
// Key-Value Store Port
// =============================================================================

/// Port for one remote key-value backend.
///
/// Mirrors the slice of the backend surface the cache relies on: plain
/// get/set/expire/delete, a sorted-set primitive for the recency index, and
/// atomic batch execution scoped to this one store. Implementations must be
/// safe for concurrent callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store `value` at `key`. Does not apply a TTL by itself.
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Apply a time-to-live to an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Add or update `member` with `score` in the sorted structure at `set`.
    async fn sorted_add(&self, set: &str, member: &str, score: i64) -> Result<()>;

    /// Members of `set` whose score falls inside `range`, ascending.
    async fn sorted_range(&self, set: &str, range: ScoreRange) -> Result<Vec<String>>;

    /// Remove every member of `set` whose score falls inside `range`.
    async fn sorted_remove_range(&self, set: &str, range: ScoreRange) -> Result<()>;

    /// Count the members of `set` whose score falls inside `range`.
    async fn sorted_count(&self, set: &str, range: ScoreRange) -> Result<u64>;

    /// Execute `batch` atomically against this store.
    async fn execute_atomic(&self, batch: StoreBatch) -> Result<()>;
}

// =============================================================================
// Clock Port
// =============================================================================

/// Port for reading the current time as a Unix timestamp.
///
/// Recency scores and sweep cutoffs are plain Unix seconds; putting the
/// clock behind a port lets expiry logic run against a manual clock in
/// tests instead of sleeping.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now_unix(&self) -> i64;
}

// =============================================================================
// Tests
// =============================================================================
