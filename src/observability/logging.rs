//! Structured logging initialization.
//!
//! Uses the tracing crate throughout; security-relevant events are emitted
//! with `target: "security"` so deployments can route them to a separate
//! audit sink via the filter.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. `default_filter` applies when RUST_LOG
/// is unset. Calling this twice panics, so it belongs to the process entry
/// point, not the library.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
