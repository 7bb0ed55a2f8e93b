//! Configuration for the replicated cache

use std::time::Duration;

/// Default per-host connection establishment timeout.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a [`ReplicatedCache`](crate::cache::ReplicatedCache).
///
/// The namespace prefixes every key stored on the backends and scopes one
/// logical cache instance. Isolation is advisory only: nothing prevents two
/// tenants on a shared backend from colliding, so the prefix must be chosen
/// unique per tenant (a trailing separator such as `:` is conventional).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Key prefix scoping this cache instance
    pub namespace: String,

    /// Time to live applied to every cached entry, and the staleness
    /// cutoff used by the expiration sweep. Must be greater than zero.
    pub ttl: Duration,

    /// Replica host addresses, in fan-out order
    pub hosts: Vec<String>,

    /// Per-host connection establishment timeout
    pub connect_timeout: Duration,
}

impl CacheConfig {
    /// Create a configuration for the given namespace, TTL and hosts.
    pub fn new(
        namespace: impl Into<String>,
        ttl_seconds: u64,
        hosts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            ttl: Duration::from_secs(ttl_seconds),
            hosts: hosts.into_iter().map(Into::into).collect(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the per-host connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// TTL in whole seconds, as applied to backend `expire` calls and
    /// subtracted from the sweep clock.
    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    pub(crate) fn validate(&self) -> crate::error::Result<()> {
        if self.ttl.as_secs() == 0 {
            return Err(crate::error::Error::Config(
                "ttl must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CacheConfig::new("app:", 3600, ["redis-eu.example.com"]);

        assert_eq!(config.namespace, "app:");
        assert_eq!(config.ttl_seconds(), 3600);
        assert_eq!(config.hosts.len(), 1);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = CacheConfig::new("app:", 0, Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connect_timeout_override() {
        let config = CacheConfig::new("app:", 60, ["a", "b"])
            .with_connect_timeout(Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }
}
