//! Service context wiring the governance subsystems together.
//!
//! There are no global singletons: the host constructs a [`Governor`],
//! shares it via `Arc`, and owns its lifecycle. `start` spawns the periodic
//! sweeps; they exit when the host triggers the shutdown coordinator.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::cache::CacheManager;
use crate::config::{GovernanceConfig, WindowStrategy};
use crate::lifecycle::Shutdown;
use crate::monitor::{HealthChecker, PerformanceMonitor, StoreProbe};
use crate::rate_limit::{AdaptiveLimiter, RateLimiter};
use crate::version::Negotiator;

pub struct Governor {
    pub config: GovernanceConfig,
    pub limiter: RateLimiter,
    pub adaptive: AdaptiveLimiter,
    pub caches: Arc<CacheManager>,
    pub monitor: Arc<PerformanceMonitor>,
    pub negotiator: Negotiator,
    pub health: HealthChecker,
}

impl Governor {
    /// Build the full context from configuration. `store` probes the
    /// external database for health checks; pass
    /// [`crate::monitor::AlwaysUpProbe`] when there is none.
    pub fn new(config: GovernanceConfig, store: Arc<dyn StoreProbe>) -> Self {
        let limiter = match config.rate_limit.strategy {
            WindowStrategy::Fixed => RateLimiter::fixed_window(),
            WindowStrategy::Sliding => RateLimiter::sliding_window(),
        };
        let adaptive = AdaptiveLimiter::new(config.rate_limit.default);
        let caches = Arc::new(CacheManager::new(config.cache.clone()));
        let monitor = Arc::new(PerformanceMonitor::new(config.monitor.clone()));
        let negotiator = Negotiator::new(config.versioning.clone());
        let health = HealthChecker::new(monitor.clone(), caches.clone(), store);

        Self {
            config,
            limiter,
            adaptive,
            caches,
            monitor,
            negotiator,
            health,
        }
    }

    /// Spawn the periodic sweeps: rate-limit record cleanup plus cache
    /// expiry per namespace. Tasks exit on the shutdown broadcast.
    pub fn start(self: &Arc<Self>, shutdown: &Shutdown) {
        let sweep_interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
        spawn_sweep(sweep_interval, shutdown, {
            let gov = self.clone();
            move || {
                gov.limiter.sweep();
            }
        });

        // Configured namespaces get their own cadence; a default-cadence
        // sweep covers lazily created ones. Sweeps are commutative, so the
        // overlap is harmless.
        for (name, ns) in &self.config.cache.namespaces {
            let cache = self.caches.namespace(name);
            let interval = Duration::from_secs(
                ns.cleanup_interval_secs
                    .unwrap_or(self.config.cache.default_cleanup_interval_secs),
            );
            spawn_sweep(interval, shutdown, move || {
                cache.purge_expired();
            });
        }

        let default_interval =
            Duration::from_secs(self.config.cache.default_cleanup_interval_secs);
        spawn_sweep(default_interval, shutdown, {
            let caches = self.caches.clone();
            move || {
                caches.purge_expired();
            }
        });

        tracing::info!(
            strategy = ?self.config.rate_limit.strategy,
            namespaces = self.config.cache.namespaces.len(),
            "governance sweeps started"
        );
    }
}

fn spawn_sweep(interval: Duration, shutdown: &Shutdown, mut sweep: impl FnMut() + Send + 'static) {
    let mut rx = shutdown.subscribe();
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // The first tick fires immediately; skip it.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => sweep(),
                _ = rx.recv() => break,
            }
        }
    });
}
