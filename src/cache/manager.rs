/// Generic in-memory cache with TTL and LRU eviction
///
/// Thread-safe, generic over key/value types, expiry measured against an
/// injected `Clock`. Tracks metrics for monitoring.
use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Cache metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<K, V> {
    data: HashMap<K, CacheEntry<V>>,
    access_order: VecDeque<K>, // front = least recently used
    metrics: CacheMetrics,
}

pub struct TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            inner: Mutex::new(Inner {
                data: HashMap::new(),
                access_order: VecDeque::new(),
                metrics: CacheMetrics::default(),
            }),
        }
    }

    /// Get value from cache (None if expired or missing)
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let Some(inserted_at) = inner.data.get(key).map(|entry| entry.inserted_at) else {
            inner.metrics.misses += 1;
            return None;
        };

        if now.saturating_duration_since(inserted_at) >= self.config.ttl {
            inner.data.remove(key);
            inner.access_order.retain(|k| k != key);
            inner.metrics.misses += 1;
            inner.metrics.expirations += 1;
            return None;
        }

        Self::touch(&mut inner, key);
        inner.metrics.hits += 1;
        inner.data.get(key).map(|entry| entry.value.clone())
    }

    /// Insert value, evicting the least recently used entry at capacity
    pub fn insert(&self, key: K, value: V) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.data.len() >= self.config.capacity && !inner.data.contains_key(&key) {
            if let Some(lru_key) = inner.access_order.pop_front() {
                inner.data.remove(&lru_key);
                inner.metrics.evictions += 1;
            }
        }

        inner.data.insert(
            key.clone(),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
        Self::touch(&mut inner, &key);
        inner.metrics.inserts += 1;
    }

    pub fn remove(&self, key: &K) {
        let mut inner = self.inner.lock();
        inner.data.remove(key);
        inner.access_order.retain(|k| k != key);
    }

    /// Drop every entry whose key matches
    pub fn remove_where<F>(&self, mut predicate: F)
    where
        F: FnMut(&K) -> bool,
    {
        let mut inner = self.inner.lock();
        inner.data.retain(|k, _| !predicate(k));
        let Inner {
            data, access_order, ..
        } = &mut *inner;
        access_order.retain(|k| data.contains_key(k));
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.data.clear();
        inner.access_order.clear();
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.inner.lock().metrics.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(inner: &mut Inner<K, V>, key: &K) {
        inner.access_order.retain(|k| k != key);
        inner.access_order.push_back(key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use std::time::Duration;

    fn cache_with_clock(ttl_secs: u64, capacity: usize) -> (TtlCache<String, String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::with_clock(CacheConfig::custom(ttl_secs, capacity), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_basic_operations() {
        let (cache, _clock) = cache_with_clock(60, 100);

        cache.insert("key1".to_string(), "value1".to_string());
        assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.get(&"nonexistent".to_string()), None);

        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.hit_rate(), 0.5);
    }

    #[test]
    fn test_ttl_expiration() {
        let (cache, clock) = cache_with_clock(10, 100);

        cache.insert("key".to_string(), "value".to_string());
        clock.advance(Duration::from_secs(9));
        assert_eq!(cache.get(&"key".to_string()), Some("value".to_string()));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"key".to_string()), None);
        assert_eq!(cache.metrics().expirations, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_refreshes_ttl() {
        let (cache, clock) = cache_with_clock(10, 100);

        cache.insert("key".to_string(), "old".to_string());
        clock.advance(Duration::from_secs(8));
        cache.insert("key".to_string(), "new".to_string());
        clock.advance(Duration::from_secs(8));
        assert_eq!(cache.get(&"key".to_string()), Some("new".to_string()));
    }

    #[test]
    fn test_lru_eviction() {
        let (cache, _clock) = cache_with_clock(60, 2);

        cache.insert("key1".to_string(), "value1".to_string());
        cache.insert("key2".to_string(), "value2".to_string());
        // key1 becomes most recently used
        assert!(cache.get(&"key1".to_string()).is_some());
        cache.insert("key3".to_string(), "value3".to_string());

        assert_eq!(cache.get(&"key2".to_string()), None);
        assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.get(&"key3".to_string()), Some("value3".to_string()));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_remove_where() {
        let (cache, _clock) = cache_with_clock(60, 10);
        cache.insert("wallet-a:sol".to_string(), "1".to_string());
        cache.insert("wallet-a:usdc".to_string(), "2".to_string());
        cache.insert("wallet-b:sol".to_string(), "3".to_string());

        cache.remove_where(|k| k.starts_with("wallet-a"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"wallet-b:sol".to_string()), Some("3".to_string()));
    }
}
