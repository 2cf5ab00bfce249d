//! Cache manager: one cache instance per namespace.
//!
//! Namespaces are constructed lazily with the policy configured for their
//! name (falling back to the defaults), so callers just ask for
//! `manager.namespace("api")` and get the right TTL/size behavior. The
//! manager also owns bulk invalidation: a write that changes one record must
//! be able to drop both that record's entry and any list/aggregate entries
//! that might contain it, across namespaces.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::store::{Cache, CachePolicy, CacheStats};
use crate::config::CacheSettings;

pub struct CacheManager {
    settings: CacheSettings,
    caches: DashMap<String, Arc<Cache>>,
}

impl CacheManager {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            settings,
            caches: DashMap::new(),
        }
    }

    /// Get or lazily create the cache for a namespace.
    pub fn namespace(&self, name: &str) -> Arc<Cache> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| {
                let policy = self.policy_for(name);
                tracing::debug!(
                    namespace = name,
                    ttl_ms = policy.ttl_ms,
                    max_size = policy.max_size,
                    "creating cache namespace"
                );
                Arc::new(Cache::new(name, policy))
            })
            .clone()
    }

    /// Resolve the policy for a namespace name from configuration.
    fn policy_for(&self, name: &str) -> CachePolicy {
        let ns = self.settings.namespaces.get(name);
        CachePolicy {
            ttl_ms: ns
                .and_then(|n| n.ttl_ms)
                .unwrap_or(self.settings.default_ttl_ms),
            max_size: ns
                .and_then(|n| n.max_size)
                .unwrap_or(self.settings.default_max_size),
            cleanup_interval_secs: ns
                .and_then(|n| n.cleanup_interval_secs)
                .unwrap_or(self.settings.default_cleanup_interval_secs),
        }
    }

    /// Invalidate keys matching a glob in one namespace.
    pub fn invalidate(&self, namespace: &str, pattern: &str) -> usize {
        let removed = self
            .caches
            .get(namespace)
            .map(|cache| cache.invalidate_pattern(pattern))
            .unwrap_or(0);
        if removed > 0 {
            tracing::debug!(namespace, pattern, removed, "bulk cache invalidation");
        }
        removed
    }

    /// Invalidate keys matching a glob in every namespace.
    pub fn invalidate_all(&self, pattern: &str) -> usize {
        self.caches
            .iter()
            .map(|entry| entry.value().invalidate_pattern(pattern))
            .sum()
    }

    /// Proactively purge expired entries in every namespace.
    pub fn purge_expired(&self) -> usize {
        self.caches
            .iter()
            .map(|entry| entry.value().purge_expired())
            .sum()
    }

    /// Names of instantiated namespaces.
    pub fn namespaces(&self) -> Vec<String> {
        self.caches.iter().map(|e| e.key().clone()).collect()
    }

    /// Stats summed across every namespace (hit rate derives from the summed
    /// counters, weighting namespaces by traffic).
    pub fn aggregate_stats(&self) -> CacheStats {
        let mut total = CacheStats::default();
        for entry in self.caches.iter() {
            let stats = entry.value().stats();
            total.entries += stats.entries;
            total.hits += stats.hits;
            total.misses += stats.misses;
            total.evictions += stats.evictions;
            total.estimated_bytes += stats.estimated_bytes;
        }
        total
    }

    /// Per-namespace stats for the admin surface.
    pub fn stats_by_namespace(&self) -> Vec<(String, CacheStats)> {
        self.caches
            .iter()
            .map(|e| (e.key().clone(), e.value().stats()))
            .collect()
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheNamespaceConfig;
    use serde_json::json;

    fn manager() -> CacheManager {
        let mut settings = CacheSettings {
            default_ttl_ms: 1000,
            default_max_size: 10,
            default_cleanup_interval_secs: 60,
            ..Default::default()
        };
        settings.namespaces.insert(
            "config".to_string(),
            CacheNamespaceConfig {
                ttl_ms: Some(60_000),
                max_size: Some(5),
                cleanup_interval_secs: None,
            },
        );
        CacheManager::new(settings)
    }

    #[test]
    fn test_namespace_policy_resolution() {
        let manager = manager();

        let api = manager.namespace("api");
        assert_eq!(api.policy().ttl_ms, 1000);
        assert_eq!(api.policy().max_size, 10);

        let config = manager.namespace("config");
        assert_eq!(config.policy().ttl_ms, 60_000);
        assert_eq!(config.policy().max_size, 5);
        // Unset fields fall back to defaults.
        assert_eq!(config.policy().cleanup_interval_secs, 60);
    }

    #[test]
    fn test_namespace_instances_are_shared() {
        let manager = manager();
        let a = manager.namespace("api");
        a.set("k", json!(1), None);

        let b = manager.namespace("api");
        assert_eq!(b.get("k"), Some(json!(1)));
        assert_eq!(manager.namespaces().len(), 1);
    }

    #[test]
    fn test_cross_namespace_invalidation() {
        let manager = manager();
        manager.namespace("api").set("user:1", json!(1), None);
        manager.namespace("api").set("list:users", json!([]), None);
        manager.namespace("config").set("user:1", json!(2), None);

        // A write to user 1 drops its record entry and the user list.
        assert_eq!(manager.invalidate("api", "user:*"), 1);
        assert_eq!(manager.invalidate("api", "list:users"), 1);
        assert_eq!(manager.invalidate_all("user:*"), 1);

        assert!(manager.namespace("api").is_empty());
        assert!(manager.namespace("config").is_empty());
    }

    #[test]
    fn test_aggregate_stats_sums_namespaces() {
        let manager = manager();
        manager.namespace("a").set("k", json!(1), None);
        manager.namespace("b").set("k", json!(2), None);
        manager.namespace("a").get("k");
        manager.namespace("b").get("missing");

        let stats = manager.aggregate_stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
