// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 taskweave contributors

//! Compiled-adapter cache and statistics (C7 support)
//!
//! The Tool-Output Adapter synthesizes adapter functions at runtime and
//! caches both the compiled choice (by `(source_tool, target_tool)`) and
//! repeat outputs (by `(adapter_name, hash(input))`), bounded by an LRU
//! eviction policy (§4.7 step 4).

mod hash;

pub use hash::{hash_string, hash_value};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

/// Running counters for one named adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterStats {
    pub successes: u64,
    pub failures: u64,
    #[serde(with = "duration_secs_f64")]
    pub cumulative_time: Duration,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl AdapterStats {
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn success_ratio(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            0.0
        } else {
            self.successes as f64 / total as f64
        }
    }
}

/// Process-wide cache of adapter results plus per-adapter statistics.
/// Guarded by a mutex on insert/evict, matching the concurrency model's
/// "process-wide, guarded by a mutex around insert/evict" rule (§5).
pub struct AdapterCache {
    entries: Mutex<LruCache<String, Value>>,
    stats: Mutex<HashMap<String, AdapterStats>>,
    disabled: Mutex<HashSet<String>>,
}

impl AdapterCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            stats: Mutex::new(HashMap::new()),
            disabled: Mutex::new(HashSet::new()),
        }
    }

    fn cache_key(adapter_name: &str, input: &Value) -> String {
        format!("{}:{}", adapter_name, hash_value(input))
    }

    /// Look up a cached result for `(adapter_name, input)`. Returns `None`
    /// immediately (without touching stats) if the adapter is disabled.
    pub fn get(&self, adapter_name: &str, input: &Value) -> Option<Value> {
        if self.is_disabled(adapter_name) {
            return None;
        }
        let key = Self::cache_key(adapter_name, input);
        let mut entries = self.entries.lock().unwrap();
        let hit = entries.get(&key).cloned();
        let mut stats = self.stats.lock().unwrap();
        let entry = stats.entry(adapter_name.to_string()).or_default();
        if hit.is_some() {
            entry.cache_hits += 1;
        } else {
            entry.cache_misses += 1;
        }
        hit
    }

    pub fn put(&self, adapter_name: &str, input: &Value, output: Value) {
        let key = Self::cache_key(adapter_name, input);
        self.entries.lock().unwrap().put(key, output);
    }

    pub fn record_outcome(&self, adapter_name: &str, success: bool, elapsed: Duration) {
        let mut stats = self.stats.lock().unwrap();
        let entry = stats.entry(adapter_name.to_string()).or_default();
        if success {
            entry.successes += 1;
        } else {
            entry.failures += 1;
        }
        entry.cumulative_time += elapsed;
    }

    pub fn stats(&self, adapter_name: &str) -> AdapterStats {
        self.stats
            .lock()
            .unwrap()
            .get(adapter_name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn disable(&self, adapter_name: &str) {
        self.disabled.lock().unwrap().insert(adapter_name.to_string());
    }

    pub fn enable(&self, adapter_name: &str) {
        self.disabled.lock().unwrap().remove(adapter_name);
    }

    pub fn is_disabled(&self, adapter_name: &str) -> bool {
        self.disabled.lock().unwrap().contains(adapter_name)
    }

    /// Delete every cached entry and reset statistics for `adapter_name`.
    pub fn delete(&self, adapter_name: &str) {
        let mut entries = self.entries.lock().unwrap();
        let prefix = format!("{}:", adapter_name);
        let stale: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in stale {
            entries.pop(&key);
        }
        self.stats.lock().unwrap().remove(adapter_name);
    }
}

mod duration_secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_hit_yields_value_equal_to_fresh_computation() {
        let cache = AdapterCache::new(8);
        let input = json!({"a": 1});
        assert!(cache.get("list_to_array", &input).is_none());
        cache.put("list_to_array", &input, json!([1]));
        assert_eq!(cache.get("list_to_array", &input), Some(json!([1])));
    }

    #[test]
    fn stats_track_hit_ratio() {
        let cache = AdapterCache::new(8);
        let input = json!("x");
        cache.get("wrap_single", &input); // miss
        cache.put("wrap_single", &input, json!(["x"]));
        cache.get("wrap_single", &input); // hit
        let stats = cache.stats("wrap_single");
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hit_ratio(), 0.5);
    }

    #[test]
    fn disabled_adapter_never_hits_cache() {
        let cache = AdapterCache::new(8);
        let input = json!("x");
        cache.put("unwrap_single", &input, json!("x"));
        cache.disable("unwrap_single");
        assert!(cache.get("unwrap_single", &input).is_none());
        cache.enable("unwrap_single");
        assert!(cache.get("unwrap_single", &input).is_some());
    }

    #[test]
    fn delete_clears_entries_and_stats() {
        let cache = AdapterCache::new(8);
        let input = json!("x");
        cache.put("identity", &input, json!("x"));
        cache.record_outcome("identity", true, Duration::from_millis(1));
        cache.delete("identity");
        assert!(cache.get("identity", &input).is_none());
        assert_eq!(cache.stats("identity").successes, 0);
    }
}
