// src/cache.rs
//! TTL result cache shared by the insight producers
//!
//! A thin wrapper over a `moka` sync cache holding JSON-encoded values. Keys
//! carry a producer namespace prefix so tag and analysis lookups for the same
//! transcript never collide. Races on the same key are benign: concurrent
//! misses derive the same value from the same input and last write wins.

use std::time::Duration;

use moka::sync::Cache;

use crate::config::CacheConfig;

/// Shared TTL key/value cache
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<String, String>,
    key_prefix_chars: usize,
}

impl ResultCache {
    /// Create a cache with an explicit TTL and capacity
    pub fn new(ttl: Duration, max_capacity: u64, key_prefix_chars: usize) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self {
            inner,
            key_prefix_chars,
        }
    }

    /// Create a cache from the application configuration
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            Duration::from_secs(config.ttl_secs),
            config.max_capacity,
            config.key_prefix_chars,
        )
    }

    /// Derive a cache key from a producer namespace and the input text. The
    /// key uses at most `key_prefix_chars` characters of the text.
    pub fn key(&self, namespace: &str, text: &str) -> String {
        let prefix: String = text.chars().take(self.key_prefix_chars).collect();
        format!("{}{}", namespace, prefix)
    }

    /// Look up a cached value
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    /// Store a value under the fixed TTL
    pub fn insert(&self, key: String, value: String) {
        self.inner.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_with_ttl(ttl: Duration) -> ResultCache {
        ResultCache::new(ttl, 100, 100)
    }

    #[test]
    fn namespaces_do_not_collide() {
        let cache = cache_with_ttl(Duration::from_secs(60));
        let transcript = "today was a good day";
        let tags_key = cache.key("tags:", transcript);
        let analysis_key = cache.key("analysis:", transcript);
        assert_ne!(tags_key, analysis_key);

        cache.insert(tags_key.clone(), "[\"good\"]".to_string());
        assert!(cache.get(&analysis_key).is_none());
        assert_eq!(cache.get(&tags_key).as_deref(), Some("[\"good\"]"));
    }

    #[test]
    fn key_prefix_respects_char_boundaries() {
        let cache = ResultCache::new(Duration::from_secs(60), 100, 4);
        // Multi-byte characters must not split the key mid-codepoint.
        let key = cache.key("tags:", "日記を書いた");
        assert_eq!(key, "tags:日記を書");
    }

    #[test]
    fn values_expire_after_ttl() {
        let cache = cache_with_ttl(Duration::from_millis(50));
        cache.insert("tags:hello".to_string(), "[]".to_string());
        assert!(cache.get("tags:hello").is_some());

        std::thread::sleep(Duration::from_millis(80));
        assert!(cache.get("tags:hello").is_none());
    }
}
