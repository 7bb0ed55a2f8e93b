//! Infrastructure Adapters
//!
//! Concrete implementations of the domain ports, following the
//! Port/Adapter (Hexagonal) architecture pattern.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      Cache Core                           │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │              Ports: KeyValueStore │ Clock            │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │                 Adapters (This Module)                    │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │  RedisStore │ InMemoryStore │ SystemClock │ Manual   │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! `RedisStore` is the production backend. `InMemoryStore` and
//! `ManualClock` are test doubles kept in the main tree so integration
//! tests and downstream crates can exercise replication logic without a
//! live backend.

mod clock;
mod memory;
mod redis;

pub use clock::{ManualClock, SystemClock};
pub use memory::InMemoryStore;
pub use redis::RedisStore;
