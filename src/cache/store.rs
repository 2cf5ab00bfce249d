//! Bounded key-value cache with TTL and LRU eviction.
//!
//! # Responsibilities
//! - Per-entry TTL, checked lazily at access time
//! - Strict LRU eviction once the entry count reaches `max_size`
//! - Hit/miss counters and an estimated memory footprint for observability
//!
//! # Design Decisions
//! - Recency is a monotonically increasing access counter, not wall-clock
//!   time, so ties break deterministically and clock resolution is moot
//! - The whole structure sits behind one Mutex: eviction order cannot be
//!   maintained consistently under finer-grained locking
//! - The footprint estimate (key length + serialized value length + fixed
//!   per-entry overhead) feeds observability only, never eviction decisions

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::clock;
use crate::observability::metrics;

/// Fixed per-entry bookkeeping estimate added to the footprint.
const ENTRY_OVERHEAD_BYTES: usize = 64;

/// Policy for one cache instance.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// Default TTL for entries set without an explicit one.
    pub ttl_ms: u64,

    /// Entry count at which LRU eviction kicks in.
    pub max_size: usize,

    /// Background expiry sweep interval.
    pub cleanup_interval_secs: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            max_size: 1000,
            cleanup_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    value_bytes: usize,
    expires_at_ms: u64,
    #[allow(dead_code)]
    created_at_ms: u64,
    last_access_seq: u64,
    hit_count: u64,
}

impl CacheEntry {
    /// An entry is observable while `now <= expires_at`.
    fn expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }
}

/// Counters and footprint snapshot.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub estimated_bytes: usize,
}

impl CacheStats {
    /// Hit rate in [0, 1]; zero traffic counts as zero.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    access_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// One named cache instance.
pub struct Cache {
    name: String,
    policy: CachePolicy,
    state: Mutex<CacheState>,
}

impl Cache {
    pub fn new(name: impl Into<String>, policy: CachePolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                access_seq: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Fetch a value. Expired entries are treated as absent and removed.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, clock::now_ms())
    }

    pub(crate) fn get_at(&self, key: &str, now_ms: u64) -> Option<Value> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let liveness = state.entries.get(key).map(|e| !e.expired(now_ms));
        match liveness {
            Some(true) => {
                state.access_seq += 1;
                let seq = state.access_seq;
                state.hits += 1;
                let entry = state.entries.get_mut(key).expect("entry present");
                entry.last_access_seq = seq;
                entry.hit_count += 1;
                let value = entry.value.clone();
                drop(state);
                metrics::record_cache_hit(&self.name);
                Some(value)
            }
            Some(false) => {
                state.entries.remove(key);
                state.misses += 1;
                drop(state);
                metrics::record_cache_miss(&self.name);
                None
            }
            None => {
                state.misses += 1;
                drop(state);
                metrics::record_cache_miss(&self.name);
                None
            }
        }
    }

    /// Store a value, evicting the least-recently-accessed entry if the
    /// cache is full. `ttl` defaults to the instance policy.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        self.set_at(key, value, ttl, clock::now_ms())
    }

    pub(crate) fn set_at(
        &self,
        key: impl Into<String>,
        value: Value,
        ttl: Option<Duration>,
        now_ms: u64,
    ) {
        let key = key.into();
        let ttl_ms = ttl.map(|d| d.as_millis() as u64).unwrap_or(self.policy.ttl_ms);
        let value_bytes = value.to_string().len();

        let mut state = self.state.lock().expect("cache mutex poisoned");

        if !state.entries.contains_key(&key) && state.entries.len() >= self.policy.max_size {
            // Evict the entry with the oldest access sequence.
            if let Some(victim) = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_access_seq)
                .map(|(k, _)| k.clone())
            {
                state.entries.remove(&victim);
                state.evictions += 1;
                tracing::debug!(cache = %self.name, key = %victim, "evicted LRU entry");
            }
        }

        state.access_seq += 1;
        let seq = state.access_seq;
        state.entries.insert(
            key,
            CacheEntry {
                value,
                value_bytes,
                expires_at_ms: now_ms + ttl_ms,
                created_at_ms: now_ms,
                last_access_seq: seq,
                hit_count: 0,
            },
        );
    }

    /// Remove an entry, reporting whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.entries.remove(key).is_some()
    }

    /// Whether a live entry exists. Does not refresh recency or count as a
    /// hit; expired entries are removed.
    pub fn has(&self, key: &str) -> bool {
        self.has_at(key, clock::now_ms())
    }

    pub(crate) fn has_at(&self, key: &str, now_ms: u64) -> bool {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let liveness = state.entries.get(key).map(|e| !e.expired(now_ms));
        match liveness {
            Some(true) => true,
            Some(false) => {
                state.entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Live keys, optionally filtered by a glob pattern.
    pub fn keys(&self, pattern: Option<&str>) -> Vec<String> {
        self.keys_at(pattern, clock::now_ms())
    }

    pub(crate) fn keys_at(&self, pattern: Option<&str>, now_ms: u64) -> Vec<String> {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.entries.retain(|_, e| !e.expired(now_ms));
        state
            .entries
            .keys()
            .filter(|k| pattern.map_or(true, |p| super::pattern::matches(p, k)))
            .cloned()
            .collect()
    }

    /// Remove every entry matching the glob. Returns how many were removed.
    pub fn invalidate_pattern(&self, pattern: &str) -> usize {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let before = state.entries.len();
        state
            .entries
            .retain(|k, _| !super::pattern::matches(pattern, k));
        before - state.entries.len()
    }

    /// Proactively remove expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(clock::now_ms())
    }

    pub(crate) fn purge_expired_at(&self, now_ms: u64) -> usize {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        let before = state.entries.len();
        state.entries.retain(|_, e| !e.expired(now_ms));
        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::debug!(cache = %self.name, removed, "purged expired entries");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("cache mutex poisoned");
        state.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit count for one entry, if present.
    pub fn hit_count(&self, key: &str) -> Option<u64> {
        let state = self.state.lock().expect("cache mutex poisoned");
        state.entries.get(key).map(|e| e.hit_count)
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock().expect("cache mutex poisoned");
        let estimated_bytes = state
            .entries
            .iter()
            .map(|(k, e)| k.len() + e.value_bytes + ENTRY_OVERHEAD_BYTES)
            .sum();
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            estimated_bytes,
        }
    }

    /// Typed convenience over [`Cache::set`].
    pub fn set_json<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl);
        Ok(())
    }

    /// Typed convenience over [`Cache::get`].
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|v| serde_json::from_value(v).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(max_size: usize, ttl_ms: u64) -> Cache {
        Cache::new(
            "test",
            CachePolicy {
                ttl_ms,
                max_size,
                cleanup_interval_secs: 60,
            },
        )
    }

    #[test]
    fn test_ttl_boundary_is_strict() {
        let cache = cache(10, 100);
        cache.set_at("k", json!(1), None, 0);

        // Observable at any instant up to and including expiry...
        assert!(cache.get_at("k", 50).is_some());
        assert!(cache.get_at("k", 100).is_some());
        // ...and gone strictly after.
        assert!(cache.get_at("k", 101).is_none());
        // Physically removed by the lazy check.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_ttl_unaffected_by_has_and_keys() {
        let cache = cache(10, 100);
        cache.set_at("k", json!(1), None, 0);

        assert!(cache.has_at("k", 50));
        assert_eq!(cache.keys_at(None, 60).len(), 1);
        assert!(cache.get_at("k", 100).is_some());

        assert!(!cache.has_at("k", 101));
        assert!(cache.get_at("k", 101).is_none());
    }

    #[test]
    fn test_explicit_ttl_overrides_policy() {
        let cache = cache(10, 1_000_000);
        cache.set_at("k", json!(1), Some(Duration::from_millis(10)), 0);
        assert!(cache.get_at("k", 11).is_none());
    }

    #[test]
    fn test_lru_evicts_least_recently_accessed() {
        let cache = cache(3, 10_000);
        cache.set_at("a", json!(1), None, 0);
        cache.set_at("b", json!(2), None, 1);
        cache.set_at("c", json!(3), None, 2);

        // Touch "a" so "b" becomes least recently accessed.
        assert!(cache.get_at("a", 3).is_some());

        cache.set_at("d", json!(4), None, 4);
        assert_eq!(cache.len(), 3);
        assert!(cache.get_at("b", 5).is_none());
        assert!(cache.get_at("a", 5).is_some());
        assert!(cache.get_at("c", 5).is_some());
        assert!(cache.get_at("d", 5).is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = cache(2, 10_000);
        cache.set_at("a", json!(1), None, 0);
        cache.set_at("b", json!(2), None, 1);
        cache.set_at("a", json!(3), None, 2);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at("a", 3), Some(json!(3)));
        assert!(cache.get_at("b", 3).is_some());
    }

    #[test]
    fn test_stats_and_hit_counts() {
        let cache = cache(10, 10_000);
        cache.set_at("k", json!({"v": 1}), None, 0);

        assert!(cache.get_at("k", 1).is_some());
        assert!(cache.get_at("k", 2).is_some());
        assert!(cache.get_at("missing", 3).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(cache.hit_count("k"), Some(2));
        assert!(stats.estimated_bytes > ENTRY_OVERHEAD_BYTES);
    }

    #[test]
    fn test_keys_with_pattern() {
        let cache = cache(10, 10_000);
        cache.set_at("user:1", json!(1), None, 0);
        cache.set_at("user:2", json!(2), None, 0);
        cache.set_at("list:users", json!([]), None, 0);

        let mut keys = cache.keys_at(Some("user:*"), 1);
        keys.sort();
        assert_eq!(keys, vec!["user:1", "user:2"]);
    }

    #[test]
    fn test_purge_expired_removes_only_expired() {
        let cache = cache(10, 100);
        cache.set_at("old", json!(1), None, 0);
        cache.set_at("new", json!(2), None, 90);

        assert_eq!(cache.purge_expired_at(150), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.has_at("new", 150));
    }

    #[test]
    fn test_typed_round_trip() {
        let cache = cache(10, 10_000);
        cache.set_json("pair", &(1u32, "x"), None).unwrap();
        let got: (u32, String) = cache.get_json("pair").unwrap();
        assert_eq!(got, (1, "x".to_string()));
    }

    #[test]
    fn test_delete_reports_presence() {
        let cache = cache(10, 10_000);
        cache.set_at("k", json!(1), None, 0);
        assert!(cache.delete("k"));
        assert!(!cache.delete("k"));
    }
}
