//! Replicated Cache Facade
//!
//! `ReplicatedCache` fans every operation out across the replica registry:
//! reads are first-hit-wins in registry order, writes and deletes are
//! best-effort against every replica, and nothing an individual replica
//! does wrong ever surfaces as a caller-visible error. The price of that
//! availability is that a caller cannot distinguish "key truly absent"
//! from "every replica unreachable"; the returned [`FanoutReport`]s and
//! the logs carry the difference.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::adapters::SystemClock;
use crate::config::CacheConfig;
use crate::domain::outcome::FanoutReport;
use crate::domain::ports::{Clock, KeyValueStore};
use crate::error::{Error, Result};
use crate::recency::RecencyIndex;
use crate::registry::ReplicaRegistry;
use crate::sweep::ExpirationSweeper;

/// Join the namespace prefix and a caller key into the backend key.
pub(crate) fn entry_key(namespace: &str, key: &str) -> String {
    format!("{namespace}{key}")
}

/// A replicated cache over independent remote backends.
///
/// Entries live for the configured TTL on each replica (backend-native
/// expiry) and are additionally reaped by [`purge_expired`] once their last
/// read falls behind the TTL. Writes never record recency, so an entry
/// that is set but never read expires only through the native TTL.
///
/// [`purge_expired`]: ReplicatedCache::purge_expired
pub struct ReplicatedCache {
    namespace: String,
    ttl: Duration,
    registry: ReplicaRegistry,
    recency: RecencyIndex,
    sweeper: ExpirationSweeper,
    clock: Arc<dyn Clock>,
}

impl ReplicatedCache {
    /// Connect to every configured host and build the cache.
    ///
    /// Unreachable hosts are logged and skipped; the cache still comes up,
    /// possibly over a subset of the replicas (or none, in which case every
    /// operation is a no-op). Only an invalid configuration is an error.
    pub async fn connect(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let registry = ReplicaRegistry::connect(&config.hosts, config.connect_timeout).await;
        Self::with_registry(config, registry)
    }

    /// Build the cache over an existing registry.
    pub fn with_registry(config: CacheConfig, registry: ReplicaRegistry) -> Result<Self> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Ok(Self {
            recency: RecencyIndex::new(&config.namespace),
            sweeper: ExpirationSweeper::new(config.namespace.clone(), config.ttl, clock.clone()),
            namespace: config.namespace,
            ttl: config.ttl,
            registry,
            clock,
        })
    }

    /// Replace the clock (tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.sweeper = ExpirationSweeper::new(self.namespace.clone(), self.ttl, clock.clone());
        self.clock = clock;
        self
    }

    /// Fetch `key` from the first replica that has it.
    ///
    /// Replicas are tried in registry order; per-replica failures are
    /// logged and the next replica is tried. A hit refreshes the recency
    /// record on **every** replica (each best-effort) before returning, and
    /// the remaining replicas are not queried. Returns `None` when no
    /// reachable replica holds the key.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entry_key = entry_key(&self.namespace, key);

        for replica in self.registry.iter() {
            match replica.store().get(&entry_key).await {
                Ok(Some(value)) => {
                    debug!(host = %replica.host(), "cache hit");
                    self.touch_all(key).await;
                    return Some(value);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(host = %replica.host(), %error, "replica read failed");
                }
            }
        }

        None
    }

    /// Store `key = value` on every replica, best-effort.
    ///
    /// Each replica independently gets the write followed by a TTL of the
    /// configured duration; a failed sub-step is recorded in the report and
    /// the fan-out continues. The recency index is not touched; only reads
    /// feed it.
    #[instrument(skip(self, value), fields(namespace = %self.namespace))]
    pub async fn set(&self, key: &str, value: impl Into<Bytes>) -> FanoutReport {
        let entry_key = entry_key(&self.namespace, key);
        let value = value.into();
        let mut report = FanoutReport::new();

        for replica in self.registry.iter() {
            let result = write_with_ttl(replica.store(), &entry_key, value.clone(), self.ttl).await;
            if let Err(error) = &result {
                warn!(host = %replica.host(), %error, "replica write failed");
            }
            report.record(replica.host(), result);
        }

        report
    }

    /// Remove `key` from every replica, best-effort.
    ///
    /// The recency record is deliberately left behind; a later sweep reaps
    /// it once its last-read time falls behind the TTL. Under delete-heavy
    /// workloads the index only stays bounded if sweeps run often enough.
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn delete(&self, key: &str) -> FanoutReport {
        let entry_key = entry_key(&self.namespace, key);
        let mut report = FanoutReport::new();

        for replica in self.registry.iter() {
            let result = replica.store().delete(&entry_key).await;
            if let Err(error) = &result {
                warn!(host = %replica.host(), %error, "replica delete failed");
            }
            report.record(replica.host(), result);
        }

        report
    }

    /// Reap entries whose last read is older than the TTL, on every replica.
    pub async fn purge_expired(&self) -> FanoutReport {
        self.sweeper.purge_expired(&self.registry).await
    }

    /// Number of keys tracked by the recency index on the first replica.
    ///
    /// A diagnostic, not an aggregate: replicas other than index 0 are not
    /// consulted, and keys never read are not counted. Errors when no
    /// replica is configured or the first replica is unreachable.
    pub async fn local_cache_size(&self) -> Result<u64> {
        let replica = self.registry.first().ok_or(Error::NoReplicas)?;
        self.recency.len(replica.store()).await
    }

    /// Number of connected replicas.
    pub fn replica_count(&self) -> usize {
        self.registry.len()
    }

    /// The namespace prefix scoping this cache.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The TTL applied to entries and used as the sweep cutoff.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Release every replica connection.
    pub fn shutdown(self) {
        self.registry.shutdown();
    }

    // Refresh the recency record for `key` on every configured replica.
    // Failures are logged, never propagated: losing a touch only delays
    // the sweep for that replica.
    async fn touch_all(&self, key: &str) {
        let now = self.clock.now_unix();
        for replica in self.registry.iter() {
            if let Err(error) = self.recency.touch(replica.store(), key, now).await {
                warn!(host = %replica.host(), %error, "recency touch failed");
            }
        }
    }
}

impl std::fmt::Debug for ReplicatedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicatedCache")
            .field("namespace", &self.namespace)
            .field("ttl", &self.ttl)
            .field("replicas", &self.registry.len())
            .finish()
    }
}

async fn write_with_ttl(
    store: &dyn KeyValueStore,
    entry_key: &str,
    value: Bytes,
    ttl: Duration,
) -> Result<()> {
    store.set(entry_key, value).await?;
    store.expire(entry_key, ttl).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key_is_plain_concatenation() {
        assert_eq!(entry_key("sessions:", "user:1"), "sessions:user:1");
        assert_eq!(entry_key("", "k"), "k");
    }
}
