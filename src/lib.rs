//! geocache - Geo-Distributed Replicated Cache
//!
//! A caching layer replicated across several independent Redis backends,
//! built for geographically distributed readers and writers: best-effort
//! replication, first-hit-wins reads, and two complementary expiration
//! mechanisms (backend-native TTL plus an active recency-based sweep).
//!
//! # Architecture
//!
//! ```text
//! caller ──► ReplicatedCache ──► ReplicaRegistry ──► replica 0..n
//!                 │                                   (KeyValueStore port)
//!                 ├── RecencyIndex   (read-driven, per replica)
//!                 └── ExpirationSweeper (externally scheduled)
//! ```
//!
//! Every operation fans out sequentially over the registry. Failures on
//! one replica never abort the others and never reach the caller; write
//! paths return a [`FanoutReport`] so partial failure stays observable.
//! This is availability-first caching, not a consensus protocol: there is
//! no cross-replica atomicity and no ordering between concurrent writers.
//!
//! # Example
//!
//! ```no_run
//! use geocache::{CacheConfig, ReplicatedCache};
//!
//! # async fn demo() -> geocache::Result<()> {
//! let config = CacheConfig::new(
//!     "sessions:",
//!     3600,
//!     ["redis-eu.example.com", "redis-us.example.com"],
//! );
//! let cache = ReplicatedCache::connect(config).await?;
//!
//! cache.set("user:123", "JohnDoe").await;
//! if let Some(value) = cache.get("user:123").await {
//!     println!("hit: {value:?}");
//! }
//!
//! cache.purge_expired().await;
//! cache.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`adapters`] - Backend and clock adapters implementing the domain ports
//! - [`cache`] - The replicated cache facade
//! - [`config`] - Cache configuration
//! - [`domain`] - Ports and fan-out outcomes
//! - [`error`] - Error types
//! - [`recency`] - Per-replica last-read index
//! - [`registry`] - Replica connection registry
//! - [`sweep`] - Recency-based expiration sweeper

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod recency;
pub mod registry;
pub mod sweep;

// Re-export commonly used types
pub use cache::ReplicatedCache;
pub use config::CacheConfig;
pub use domain::outcome::{FanoutReport, ReplicaOutcome};
pub use error::{Error, Result};
pub use recency::RecencyIndex;
pub use registry::{Replica, ReplicaRegistry};
pub use sweep::ExpirationSweeper;
