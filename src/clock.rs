//! Wall-clock helpers.
//!
//! All governance state is timestamped in unix milliseconds so that window
//! arithmetic, TTL checks and wire timestamps share one representation.
//! Time-sensitive internals take an explicit `now_ms` parameter; these
//! helpers supply it at the public API surface.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current unix time in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Current unix time in seconds.
pub fn now_secs() -> u64 {
    now_ms() / 1000
}

/// Convert a millisecond timestamp to unix seconds, rounding up.
///
/// Used for `X-RateLimit-Reset` so the advertised reset is never earlier
/// than the actual one.
pub fn ms_to_secs_ceil(ms: u64) -> u64 {
    ms.div_ceil(1000)
}
