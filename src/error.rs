//! Error types for the replicated cache

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the replicated cache.
///
/// Connection errors arise at construction time and are recovered by
/// skipping the offending host. Per-replica operation errors are caught
/// inside each fan-out loop and surface only through the
/// [`FanoutReport`](crate::domain::outcome::FanoutReport) and the logs;
/// the sole caller-visible failure paths are `local_cache_size` on an
/// unconfigured or unreachable first replica, and invalid configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to establish a connection to a replica host
    #[error("failed to connect to replica at {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: redis::RedisError,
    },

    /// Connection attempt did not complete within the configured timeout
    #[error("connection to replica at {host} timed out after {timeout:?}")]
    ConnectTimeout { host: String, timeout: Duration },

    /// A backend command failed on one replica
    #[error("replica command failed: {0}")]
    Backend(#[from] redis::RedisError),

    /// Replica refused the operation (unreachable or deliberately faulted)
    #[error("replica unavailable: {0}")]
    Unavailable(String),

    /// No replicas are configured
    #[error("no replicas configured")]
    NoReplicas,

    /// Configuration error
    #[error("invalid configuration: {0}")]
    Config(String),
}
