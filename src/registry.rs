//! Replica Registry
//!
//! Establishes and owns the ordered set of backend connections. Hosts that
//! cannot be reached at construction are logged and skipped, never retried;
//! the registry holds whatever subset succeeds, possibly none. With an
//! empty registry every cache operation degrades to a no-op.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::adapters::RedisStore;
use crate::domain::ports::KeyValueStore;

/// One connected backend replica.
#[derive(Clone)]
pub struct Replica {
    host: String,
    store: Arc<dyn KeyValueStore>,
}

impl Replica {
    pub fn new(host: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            host: host.into(),
            store,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for Replica {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replica").field("host", &self.host).finish()
    }
}

/// The ordered set of replica connections.
///
/// Construction is the only time connections are made; the replica list is
/// read-only afterwards and safe for concurrent callers. The registry owns
/// its stores: dropping it (or calling [`ReplicaRegistry::shutdown`])
/// releases every connection.
pub struct ReplicaRegistry {
    replicas: Vec<Replica>,
}

impl ReplicaRegistry {
    /// Connect to each host in order, skipping any that fail.
    pub async fn connect(hosts: &[String], connect_timeout: Duration) -> Self {
        let mut replicas = Vec::with_capacity(hosts.len());

        for host in hosts {
            match RedisStore::connect(host, connect_timeout).await {
                Ok(store) => {
                    debug!(host = %host, "connected to replica");
                    replicas.push(Replica::new(host.clone(), Arc::new(store) as _));
                }
                Err(error) => {
                    warn!(host = %host, %error, "skipping unreachable replica");
                }
            }
        }

        info!(
            configured = hosts.len(),
            connected = replicas.len(),
            "replica registry ready"
        );
        Self { replicas }
    }

    /// Assemble a registry from pre-built stores (tests, custom backends).
    pub fn from_replicas(replicas: Vec<Replica>) -> Self {
        Self { replicas }
    }

    /// Replicas in fan-out order.
    pub fn iter(&self) -> std::slice::Iter<'_, Replica> {
        self.replicas.iter()
    }

    /// The designated first replica, used by the size probe.
    pub fn first(&self) -> Option<&Replica> {
        self.replicas.first()
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Release every connection.
    pub fn shutdown(self) {
        info!(replicas = self.replicas.len(), "shutting down replica registry");
        drop(self.replicas);
    }
}

impl std::fmt::Debug for ReplicaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaRegistry")
            .field("hosts", &self.replicas.iter().map(Replica::host).collect::<Vec<_>>())
            .finish()
    }
}
