//! In-memory TTL cache for AI annotations and channel lookups.
//!
//! Lives for the process; nothing is persisted. Expired entries are dropped
//! lazily on read, and in bulk by `evict_expired` at the start of each
//! annotation pass.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::traits::Cache;

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        {
            let entries = self.entries.read().ok()?;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop it so the map doesn't grow with dead keys.
        if let Ok(mut entries) = self.entries.write() {
            if entries.get(key).is_some_and(|e| e.expires_at <= now) {
                entries.remove(key);
            }
        }
        None
    }

    fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    fn evict_expired(&self) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        let before = entries.len();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

/// `namespace:sha256(json(input))`. Equal inputs always map to the same key.
pub fn cache_key<K: Serialize + ?Sized>(namespace: &str, input: &K) -> String {
    let bytes = serde_json::to_vec(input).unwrap_or_default();
    format!("{namespace}:{}", hex::encode(Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get() {
        let cache = MemoryCache::new();
        cache.set("k", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn cached_null_is_a_hit() {
        let cache = MemoryCache::new();
        cache.set("neg", serde_json::Value::Null, Duration::from_secs(60));
        assert_eq!(cache.get("neg"), Some(serde_json::Value::Null));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = MemoryCache::new();
        cache.set("k", json!(1), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn evict_expired_keeps_live_entries() {
        let cache = MemoryCache::new();
        cache.set("dead", json!(1), Duration::ZERO);
        cache.set("live", json!(2), Duration::from_secs(60));
        assert_eq!(cache.evict_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn keys_are_content_derived() {
        let a = cache_key("mino", &("Bread Lab", "desc"));
        let b = cache_key("mino", &("Bread Lab", "desc"));
        let c = cache_key("mino", &("Bread Lab", "other"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("mino:"));
        assert_ne!(cache_key("links", &("Bread Lab", "desc")), a);
    }
}
