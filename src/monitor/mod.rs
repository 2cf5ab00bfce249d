//! Performance monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Request completes
//!     -> record_metric / record_error   (ring-buffer ingestion)
//!     -> threshold analysis             (slow request / memory / error rate)
//!     -> alert ring (bounded, drop-oldest)
//!
//! Queries:
//!     stats()        -> trailing-24h aggregates from the rings
//!     health check   -> store probe + cache + memory + per-route rollups
//! ```
//!
//! # Design Decisions
//! - Both ingestion buffers silently drop the oldest entry when full; the
//!   monitor reasons over a recent window, never all-time history
//! - Analysis runs synchronously on ingestion; there is no sampling task
//! - Alerts are observations, not errors; they never abort a request

pub mod alert;
pub mod health;
pub mod metric;
#[allow(clippy::module_inception)]
pub mod monitor;
pub mod ring;

pub use alert::{Alert, AlertLevel};
pub use health::{
    AlwaysUpProbe, CheckStatus, HealthChecker, HealthReport, HealthStatus, StoreProbe,
};
pub use metric::{ErrorMetric, MemorySnapshot, PerformanceMetric};
pub use monitor::{
    FixedMemoryProbe, MemoryProbe, MonitorStats, PerformanceMonitor, ProcMemoryProbe, RouteRollup,
};
pub use ring::Ring;
