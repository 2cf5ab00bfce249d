//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     -> logging.rs (structured log events; "security" target for audit)
//!     -> metrics.rs (counters, histograms; Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; filter configurable via env or config
//! - Metric updates are cheap atomic increments
//! - The PerformanceMonitor keeps its own ring buffers; this module only
//!   covers operational counters and log plumbing

pub mod logging;
pub mod metrics;
