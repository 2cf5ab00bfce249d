//! Load-adaptive rescaling of rate-limit windows.
//!
//! Wraps a base window and shrinks `max_requests` under load pressure. This
//! is a read-only adjustment: it produces a derived [`RateLimitConfig`] and
//! never touches the limiter's stored records. It is an extension point for
//! hosts with live CPU/memory readings; no sampling cadence is assumed here,
//! callers supply whatever readings they have.

use crate::config::RateLimitConfig;

/// A recent CPU/memory reading, as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemLoad {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl SystemLoad {
    pub fn new(cpu_percent: f64, memory_percent: f64) -> Self {
        Self {
            cpu_percent,
            memory_percent,
        }
    }

    /// Average of the CPU and memory readings.
    pub fn average(&self) -> f64 {
        (self.cpu_percent + self.memory_percent) / 2.0
    }
}

/// Rescales a base window by a load factor.
#[derive(Debug, Clone)]
pub struct AdaptiveLimiter {
    base: RateLimitConfig,
}

impl AdaptiveLimiter {
    pub fn new(base: RateLimitConfig) -> Self {
        Self { base }
    }

    pub fn base(&self) -> RateLimitConfig {
        self.base
    }

    /// Load factor for a reading: above 80% average usage halves the budget,
    /// above 60% trims it to 0.7x, otherwise the base applies unchanged.
    pub fn load_factor(load: &SystemLoad) -> f64 {
        let avg = load.average();
        if avg > 80.0 {
            0.5
        } else if avg > 60.0 {
            0.7
        } else {
            1.0
        }
    }

    /// The base window rescaled for the given reading. `max_requests` never
    /// drops below 1 so a loaded system degrades instead of blackholing.
    pub fn scaled(&self, load: &SystemLoad) -> RateLimitConfig {
        let factor = Self::load_factor(load);
        let max_requests = ((self.base.max_requests as f64 * factor) as u32).max(1);
        RateLimitConfig {
            max_requests,
            window_ms: self.base.window_ms,
        }
    }
}
