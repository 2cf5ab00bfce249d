//! Rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     -> key derivation (key.rs: ip / user / user+route)
//!     -> window check (window.rs: prune, count, admit/reject)
//!     -> decision surfaced via X-RateLimit-* headers, 429 on reject
//!
//! Periodic sweep:
//!     interval timer -> drop records whose window fully elapsed
//! ```
//!
//! # Design Decisions
//! - Per-key timestamp lists, bounded by max_requests
//! - Fixed and sliding accounting share the algorithm, not the keyspace
//! - Adaptive rescaling is a pure derivation, never mutating stored records

pub mod adaptive;
pub mod key;
pub mod window;

pub use adaptive::{AdaptiveLimiter, SystemLoad};
pub use window::{RateLimitDecision, RateLimiter, WindowMode};
