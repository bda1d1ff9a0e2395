//! Result cache for optimized prompts
//!
//! Entries are keyed by a SHA-256 prefix of the full input text plus the
//! strategy name. Two texts sharing a 64-bit hash prefix are treated as the
//! same prompt.

mod lru;

pub use lru::LruMap;

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

/// Default number of cached results
pub const DEFAULT_CAPACITY: usize = 1024;

/// Bytes of the SHA-256 digest kept in a key
const HASH_PREFIX_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub prompt_hash: String,
    pub strategy: String,
}

impl CacheKey {
    pub fn new(text: &str, strategy: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        Self {
            prompt_hash: hex::encode(&digest[..HASH_PREFIX_BYTES]),
            strategy: strategy.to_string(),
        }
    }
}

/// Cache effectiveness counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, 0.0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Cache Summary ===")?;
        writeln!(f, "Hits: {}", self.hits)?;
        writeln!(f, "Misses: {}", self.misses)?;
        writeln!(f, "Hit rate: {:.1}%", self.hit_rate() * 100.0)?;
        writeln!(f, "Writes: {}", self.writes)?;
        writeln!(f, "Evictions: {}", self.evictions)?;
        Ok(())
    }
}

/// LRU cache of optimized prompt text
#[derive(Debug)]
pub struct PromptCache {
    entries: LruMap<CacheKey, String>,
    stats: CacheStats,
}

impl PromptCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruMap::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Cached result for `text` under `strategy`; a hit refreshes recency.
    pub fn get(&mut self, text: &str, strategy: &str) -> Option<String> {
        let key = CacheKey::new(text, strategy);
        match self.entries.get(&key) {
            Some(optimized) => {
                self.stats.hits += 1;
                debug!("Cache hit for {} ({})", key.prompt_hash, strategy);
                Some(optimized.clone())
            }
            None => {
                self.stats.misses += 1;
                debug!("Cache miss for {} ({})", key.prompt_hash, strategy);
                None
            }
        }
    }

    pub fn put(&mut self, text: &str, strategy: &str, optimized: impl Into<String>) {
        let key = CacheKey::new(text, strategy);
        self.stats.writes += 1;
        if let Some((evicted, _)) = self.entries.put(key, optimized.into()) {
            self.stats.evictions += 1;
            debug!("Evicted {} ({})", evicted.prompt_hash, evicted.strategy);
        }
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl Default for PromptCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let mut cache = PromptCache::new(4);
        cache.put("hello world", "moderate", "hello");
        assert_eq!(cache.get("hello world", "moderate").as_deref(), Some("hello"));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_miss() {
        let mut cache = PromptCache::new(4);
        assert_eq!(cache.get("nonexistent", "moderate"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_strategy_is_part_of_key() {
        let mut cache = PromptCache::new(4);
        cache.put("hello world", "moderate", "hello");
        assert_eq!(cache.get("hello world", "aggressive"), None);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = PromptCache::new(2);
        cache.put("a", "s", "A");
        cache.put("b", "s", "B");
        // Touch "a" so "b" is the least recently used
        assert!(cache.get("a", "s").is_some());
        cache.put("c", "s", "C");

        assert_eq!(cache.size(), 2);
        assert_eq!(cache.get("b", "s"), None);
        assert_eq!(cache.get("a", "s").as_deref(), Some("A"));
        assert_eq!(cache.get("c", "s").as_deref(), Some("C"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_untouched_oldest_is_evicted() {
        let mut cache = PromptCache::new(2);
        cache.put("a", "s", "A");
        cache.put("b", "s", "B");
        cache.put("c", "s", "C");
        assert_eq!(cache.get("a", "s"), None);
        assert!(cache.get("b", "s").is_some());
    }

    #[test]
    fn test_clear() {
        let mut cache = PromptCache::new(4);
        cache.put("a", "s", "A");
        cache.put("b", "s", "B");
        cache.clear();
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.get("a", "s"), None);
    }

    #[test]
    fn test_hit_rate() {
        let mut cache = PromptCache::new(4);
        assert_eq!(cache.stats().hit_rate(), 0.0);
        cache.put("a", "s", "A");
        cache.get("a", "s");
        cache.get("b", "s");
        assert_eq!(cache.stats().hit_rate(), 0.5);
        assert!(cache.stats().to_string().contains("Hit rate: 50.0%"));
    }

    #[test]
    fn test_cache_key_is_stable() {
        let key = CacheKey::new("hello", "moderate");
        assert_eq!(key.prompt_hash.len(), 16);
        assert_eq!(key.prompt_hash, "2cf24dba5fb0a30e");
        assert_eq!(key, CacheKey::new("hello", "moderate"));
        assert_ne!(key, CacheKey::new("hello!", "moderate"));
    }
}
