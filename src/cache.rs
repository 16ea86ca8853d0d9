// In-memory response cache with a fixed time-to-live per instance.
// Entries expire lazily on read; there is no background sweep.

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub eviction_count: usize,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    // None keeps the cache unbounded, entries only leave through expiry or clear()
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            max_entries: None,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Default::default()
        }
    }
}

// Build a cache key from a prefix and the request's distinguishing parameters,
// e.g. ("cities", ["SP"]) -> "cities_SP"
pub fn create_cache_key(prefix: &str, parts: &[&str]) -> String {
    let mut key = String::from(prefix);
    for part in parts {
        key.push('_');
        key.push_str(part);
    }
    key
}

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at_millis: i64,
}

/// Key -> (value, timestamp) map. Any value handed back satisfies
/// `now - stored_at < ttl`.
pub struct TimedCache<T> {
    store: DashMap<String, CacheEntry<T>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    cache_stats: RwLock<CacheStats>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_config(CacheConfig::with_ttl(ttl), Arc::new(SystemClock))
    }

    pub fn with_config(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            config,
            clock,
            cache_stats: RwLock::new(CacheStats::default()),
        }
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.config.ttl.as_millis()).unwrap_or(i64::MAX)
    }

    fn is_alive(&self, entry: &CacheEntry<T>, now: i64) -> bool {
        now.saturating_sub(entry.stored_at_millis) < self.ttl_millis()
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now_millis();

        let found = self
            .store
            .get(key)
            .map(|entry| (self.is_alive(&entry, now), entry.value.clone()));

        let mut stats = self.cache_stats.write();
        match found {
            Some((true, value)) => {
                stats.hit_count += 1;
                debug!(key, "cache hit");
                Some(value)
            }
            Some((false, _)) => {
                // expired entries read as absent, they stay until overwritten or swept
                stats.miss_count += 1;
                stats.expired_count += 1;
                debug!(key, "cache entry expired");
                None
            }
            None => {
                stats.miss_count += 1;
                debug!(key, "cache miss");
                None
            }
        }
    }

    pub fn set(&self, key: impl Into<String>, value: T) {
        let key = key.into();
        let now = self.clock.now_millis();

        if let Some(max) = self.config.max_entries {
            if !self.store.contains_key(&key) && self.store.len() >= max {
                self.purge_expired();
                while self.store.len() >= max.max(1) {
                    if !self.remove_oldest() {
                        break;
                    }
                }
            }
        }

        self.store.insert(
            key,
            CacheEntry {
                value,
                stored_at_millis: now,
            },
        );
        self.cache_stats.write().items_count = self.store.len();
    }

    pub fn remove(&self, key: &str) -> Option<T> {
        let removed = self.store.remove(key).map(|(_, entry)| entry.value);
        self.cache_stats.write().items_count = self.store.len();
        removed
    }

    pub fn clear(&self) {
        self.store.clear();
        self.cache_stats.write().items_count = 0;
    }

    /// Drop every expired entry now. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.store.len();
        self.store.retain(|_, entry| self.is_alive(entry, now));
        let removed = before.saturating_sub(self.store.len());

        let mut stats = self.cache_stats.write();
        stats.expired_count += removed;
        stats.items_count = self.store.len();
        removed
    }

    fn remove_oldest(&self) -> bool {
        let oldest = self
            .store
            .iter()
            .min_by_key(|entry| entry.stored_at_millis)
            .map(|entry| entry.key().clone());

        match oldest {
            Some(key) => {
                self.store.remove(&key);
                let mut stats = self.cache_stats.write();
                stats.eviction_count += 1;
                stats.items_count = self.store.len();
                debug!(key = %key, "evicted oldest cache entry");
                true
            }
            None => false,
        }
    }

    // Includes entries that have expired but not yet been swept
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache_stats.read().clone()
    }
}
