//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Request handler
//!     -> manager.namespace(name)    (lazy construction, per-namespace policy)
//!     -> cache.get / cache.set      (lazy TTL check, LRU eviction)
//!
//! Writes:
//!     record update -> manager.invalidate(ns, "record:*")  (glob matcher)
//!
//! Periodic sweep:
//!     interval timer -> purge_expired() per namespace
//! ```
//!
//! # Design Decisions
//! - TTL is checked lazily on access; the sweep only bounds memory between
//!   accesses
//! - LRU order uses a monotonic access counter, not wall-clock time
//! - Stats are for observability and never drive eviction

pub mod manager;
pub mod pattern;
pub mod store;

pub use manager::CacheManager;
pub use store::{Cache, CachePolicy, CacheStats};
