//! Windowed request limiter.
//!
//! One record per key holds the timestamps of admitted requests inside the
//! current window. `check` prunes timestamps older than `now - window_ms`,
//! compares the remaining count to `max_requests`, and appends the current
//! timestamp on admit. The timestamp list is bounded by `max_requests`, so a
//! check is O(window size) with a hard cap.
//!
//! Fixed-window and sliding-window instances run the same algorithm over
//! independent keyspaces. The difference callers care about: fixed-window
//! accounting can admit up to `2 x max_requests` in a pathological burst
//! straddling a window edge; sliding-window accounting cannot, at the price
//! of stricter boundary behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::clock;
use crate::config::RateLimitConfig;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request is admitted.
    pub allowed: bool,

    /// Requests left in the window after this decision.
    pub remaining: u32,

    /// When the window frees up, unix milliseconds.
    pub reset_unix_ms: u64,

    /// Requests counted in the window, including this one if admitted.
    pub total_hits: u32,
}

/// Per-key window state.
///
/// Invariant: `timestamps` holds only entries within `[now - window_ms, now]`
/// after a check, and never more than the configured `max_requests`.
#[derive(Debug)]
struct WindowRecord {
    timestamps: VecDeque<u64>,
    reset_ms: u64,
}

/// Accounting label, used only for logging and introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Fixed,
    Sliding,
}

/// Tracks per-key request counts and decides admit/reject.
///
/// Records are created on first sight of a key, mutated on every check, and
/// garbage-collected by [`RateLimiter::sweep`] once their window has fully
/// elapsed, bounding memory to the number of active keys.
pub struct RateLimiter {
    records: Mutex<HashMap<String, WindowRecord>>,
    mode: WindowMode,
}

impl RateLimiter {
    /// Fixed-window instance.
    pub fn fixed_window() -> Self {
        Self::with_mode(WindowMode::Fixed)
    }

    /// Sliding-window instance, keyed independently from any fixed-window one.
    pub fn sliding_window() -> Self {
        Self::with_mode(WindowMode::Sliding)
    }

    fn with_mode(mode: WindowMode) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            mode,
        }
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Check and account one request for `key` under `cfg`.
    pub fn check(&self, key: &str, cfg: &RateLimitConfig) -> RateLimitDecision {
        self.check_at(key, cfg, clock::now_ms())
    }

    pub(crate) fn check_at(
        &self,
        key: &str,
        cfg: &RateLimitConfig,
        now_ms: u64,
    ) -> RateLimitDecision {
        let mut records = self.records.lock().expect("rate limiter mutex poisoned");
        let record = records.entry(key.to_string()).or_insert_with(|| WindowRecord {
            timestamps: VecDeque::new(),
            reset_ms: now_ms + cfg.window_ms,
        });

        let floor = now_ms.saturating_sub(cfg.window_ms);
        while let Some(&oldest) = record.timestamps.front() {
            if oldest < floor {
                record.timestamps.pop_front();
            } else {
                break;
            }
        }

        let total = record.timestamps.len() as u32;
        if total >= cfg.max_requests {
            // The window frees up once the oldest hit ages out.
            record.reset_ms = record
                .timestamps
                .front()
                .map(|t| t + cfg.window_ms)
                .unwrap_or(now_ms + cfg.window_ms);
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_unix_ms: record.reset_ms,
                total_hits: total,
            };
        }

        record.timestamps.push_back(now_ms);
        record.reset_ms = record
            .timestamps
            .front()
            .map(|t| t + cfg.window_ms)
            .unwrap_or(now_ms + cfg.window_ms);

        RateLimitDecision {
            allowed: true,
            remaining: cfg.max_requests - total - 1,
            reset_unix_ms: record.reset_ms,
            total_hits: total + 1,
        }
    }

    /// Remove records whose window has fully elapsed. Returns how many were
    /// dropped. Commutative with concurrent per-key checks: only records whose
    /// reset time has already passed are removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(clock::now_ms())
    }

    pub(crate) fn sweep_at(&self, now_ms: u64) -> usize {
        let mut records = self.records.lock().expect("rate limiter mutex poisoned");
        let before = records.len();
        records.retain(|_, record| record.reset_ms > now_ms && !record.timestamps.is_empty());
        let removed = before - records.len();
        if removed > 0 {
            tracing::debug!(mode = ?self.mode, removed, "swept expired rate-limit records");
        }
        removed
    }

    /// Number of keys with live records.
    pub fn active_keys(&self) -> usize {
        self.records
            .lock()
            .expect("rate limiter mutex poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(max_requests: u32, window_ms: u64) -> RateLimitConfig {
        RateLimitConfig {
            max_requests,
            window_ms,
        }
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::fixed_window();
        let cfg = cfg(2, 1000);

        assert!(limiter.check_at("ip:1.1.1.1", &cfg, 0).allowed);
        assert!(limiter.check_at("ip:1.1.1.1", &cfg, 10).allowed);

        let rejected = limiter.check_at("ip:1.1.1.1", &cfg, 20);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.total_hits, 2);
    }

    #[test]
    fn test_window_reopens_after_oldest_hit_expires() {
        // 3 requests / 10s for one key: t=0,1,2s admitted with remaining
        // 2,1,0; t=5s rejected; t=11s admitted again once t=0 aged out.
        let limiter = RateLimiter::fixed_window();
        let cfg = cfg(3, 10_000);
        let key = "ip:1.2.3.4";

        let d = limiter.check_at(key, &cfg, 0);
        assert!(d.allowed);
        assert_eq!(d.remaining, 2);
        let d = limiter.check_at(key, &cfg, 1000);
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
        let d = limiter.check_at(key, &cfg, 2000);
        assert!(d.allowed);
        assert_eq!(d.remaining, 0);

        let d = limiter.check_at(key, &cfg, 5000);
        assert!(!d.allowed);
        assert_eq!(d.total_hits, 3);
        // Rejected caller can retry once the earliest hit leaves the window.
        assert_eq!(d.reset_unix_ms, 10_000);

        let d = limiter.check_at(key, &cfg, 11_000);
        assert!(d.allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::fixed_window();
        let cfg = cfg(1, 1000);

        assert!(limiter.check_at("user:a", &cfg, 0).allowed);
        assert!(!limiter.check_at("user:a", &cfg, 1).allowed);
        assert!(limiter.check_at("user:b", &cfg, 1).allowed);
    }

    #[test]
    fn test_timestamps_bounded_by_max_requests() {
        let limiter = RateLimiter::sliding_window();
        let cfg = cfg(5, 1000);

        for t in 0..50 {
            limiter.check_at("k", &cfg, t);
        }
        let records = limiter.records.lock().unwrap();
        assert!(records["k"].timestamps.len() <= 5);
    }

    #[test]
    fn test_sweep_drops_only_elapsed_windows() {
        let limiter = RateLimiter::fixed_window();
        let cfg = cfg(1, 1000);

        limiter.check_at("old", &cfg, 0);
        limiter.check_at("fresh", &cfg, 900);
        assert_eq!(limiter.active_keys(), 2);

        // "old" resets at 1000; "fresh" at 1900.
        assert_eq!(limiter.sweep_at(1500), 1);
        assert_eq!(limiter.active_keys(), 1);

        // Swept key starts a clean window.
        assert!(limiter.check_at("old", &cfg, 1600).allowed);
    }

    #[test]
    fn test_reset_advertised_on_rejection() {
        let limiter = RateLimiter::fixed_window();
        let cfg = cfg(1, 60_000);

        let admitted = limiter.check_at("k", &cfg, 5000);
        assert_eq!(admitted.reset_unix_ms, 65_000);

        let rejected = limiter.check_at("k", &cfg, 6000);
        assert!(!rejected.allowed);
        assert_eq!(rejected.reset_unix_ms, 65_000);
    }
}
