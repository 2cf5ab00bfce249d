//! In-process request governance and observability layer.
//!
//! Four cooperating subsystems sit between the HTTP edge and the
//! application handlers:
//!
//! - **rate_limit**: windowed request admission with per-route overrides
//!   and load-adaptive scaling
//! - **cache**: TTL + LRU response caching behind namespaced stores
//! - **monitor**: ring-buffered performance metrics, threshold alerting
//!   and composite health checks
//! - **version**: API version negotiation with envelope transformation
//!   for legacy clients
//!
//! The [`Governor`] ties them together; [`http::apply_governance`] mounts
//! them on an axum router. Everything is plain in-process state shared via
//! `Arc`; there is no external coordination.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod rate_limit;
pub mod service;
pub mod version;

pub use config::{load_config, GovernanceConfig};
pub use error::GovernanceError;
pub use lifecycle::Shutdown;
pub use service::Governor;
