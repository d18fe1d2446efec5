/// Cache configuration per entity type
///
/// - Balances: short TTL, a swap changes them
/// - Token metadata: long TTL, changes rarely
use crate::config::CacheSettings;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached entries
    pub ttl: Duration,

    /// Maximum number of entries (LRU eviction when exceeded)
    pub capacity: usize,
}

impl CacheConfig {
    /// Wallet balance lookups
    pub fn balances(settings: &CacheSettings) -> Self {
        Self::custom(settings.balance_ttl_secs, settings.capacity)
    }

    /// Aggregator token metadata
    pub fn token_metadata(settings: &CacheSettings) -> Self {
        Self::custom(settings.token_metadata_ttl_secs, settings.capacity)
    }

    pub fn custom(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: capacity.max(1),
        }
    }
}
