//! In-memory caches for balance lookups and token metadata
//!
//! Both caches are explicit objects passed by reference (`Arc<SwapCaches>`)
//! to the components that need them; nothing here is process-global.

pub mod clock;
pub mod config;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use manager::{CacheMetrics, TtlCache};

use crate::config::CacheSettings;
use crate::logger::{self, LogTag};
use crate::swaps::types::TokenInfo;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

/// Balance cache key; `mint: None` is native SOL
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BalanceKey {
    pub owner: Pubkey,
    pub mint: Option<String>,
}

impl BalanceKey {
    pub fn sol(owner: Pubkey) -> Self {
        Self { owner, mint: None }
    }

    pub fn token(owner: Pubkey, mint: impl Into<String>) -> Self {
        Self {
            owner,
            mint: Some(mint.into()),
        }
    }
}

pub struct SwapCaches {
    pub balances: TtlCache<BalanceKey, u64>,
    pub tokens: TtlCache<String, TokenInfo>,
}

impl SwapCaches {
    pub fn new(settings: &CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            balances: TtlCache::with_clock(CacheConfig::balances(settings), clock.clone()),
            tokens: TtlCache::with_clock(CacheConfig::token_metadata(settings), clock),
        }
    }

    /// Forget every balance held for `owner`
    pub fn invalidate_owner(&self, owner: &Pubkey) {
        self.balances.remove_where(|key| key.owner == *owner);
        logger::verbose(
            LogTag::Cache,
            &format!("Invalidated cached balances for {}", owner),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_invalidate_owner_leaves_other_wallets() {
        let caches = SwapCaches::new(&CacheSettings::default());
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();

        caches.balances.insert(BalanceKey::sol(alice), 10);
        caches.balances.insert(BalanceKey::token(alice, "mint-a"), 20);
        caches.balances.insert(BalanceKey::sol(bob), 30);

        caches.invalidate_owner(&alice);
        assert_eq!(caches.balances.get(&BalanceKey::sol(alice)), None);
        assert_eq!(caches.balances.get(&BalanceKey::token(alice, "mint-a")), None);
        assert_eq!(caches.balances.get(&BalanceKey::sol(bob)), Some(30));
    }

    #[test]
    fn test_each_cache_uses_its_own_ttl() {
        let clock = Arc::new(ManualClock::new());
        let settings = CacheSettings {
            balance_ttl_secs: 10,
            token_metadata_ttl_secs: 3_600,
            capacity: 100,
        };
        let caches = SwapCaches::with_clock(&settings, clock.clone());
        let owner = Pubkey::new_unique();

        caches.balances.insert(BalanceKey::sol(owner), 1);
        caches.tokens.insert(
            "mint".to_string(),
            TokenInfo {
                mint: "mint".to_string(),
                symbol: "TKN".to_string(),
                name: "Token".to_string(),
                decimals: 6,
                usd_price: None,
                logo_uri: None,
            },
        );

        clock.advance(Duration::from_secs(11));
        assert_eq!(caches.balances.get(&BalanceKey::sol(owner)), None);
        assert!(caches.tokens.get(&"mint".to_string()).is_some());
    }
}
