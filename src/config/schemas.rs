/// Configuration schemas - all config structures defined once with defaults
///
/// Each struct is defined using the config_struct! macro which provides:
/// - Single-source definition (no repetition)
/// - Embedded defaults
/// - Serde support
use crate::config_struct;

// ============================================================================
// SWAP CONFIGURATION
// ============================================================================

config_struct! {
    /// Quote, build and submission parameters
    pub struct SwapsConfig {
        /// Slippage tolerance sent to the aggregator (percent)
        slippage_percent: f64 = 1.0,

        /// Priority fee forwarded as computeUnitPriceMicroLamports
        priority_fee_micro_lamports: u64 = 1_000,

        /// Ask the aggregator for optimized transactions (dynamic CU limit, shared accounts)
        prefer_optimized: bool = true,

        // Timeouts
        quote_timeout_secs: u64 = 5,
        build_timeout_secs: u64 = 15,
        confirmation_timeout_secs: u64 = 90,

        /// Quotes above this price impact fail as a liquidity error (percent)
        max_price_impact_pct: f64 = 10.0,

        /// Sellability check threshold (percent)
        sellable_price_impact_pct: f64 = 10.0,

        /// Lamports kept aside for fees when spending SOL
        sol_fee_reserve_lamports: u64 = 2_000_000,

        // Aggregator endpoints
        current_api_url: String = "https://lite-api.jup.ag/swap/v1".to_string(),
        legacy_api_url: String = "https://quote-api.jup.ag/v6".to_string(),
        token_api_url: String = "https://lite-api.jup.ag/tokens/v2".to_string(),
    }
}

// ============================================================================
// RECOVERY CONFIGURATION
// ============================================================================

config_struct! {
    /// Generic retry wrapper parameters
    pub struct RecoveryConfig {
        /// Retries after the first failure before the error is re-raised
        max_retries: u32 = 3,

        /// Network backoff base; attempt n waits base * 2^n
        base_delay_ms: u64 = 1_000,

        /// Fixed wait after a rate-limit response
        rate_limit_cooldown_ms: u64 = 5_000,
    }
}

// ============================================================================
// RPC CONFIGURATION
// ============================================================================

config_struct! {
    /// RPC endpoint configuration
    pub struct RpcConfig {
        /// Ordered fallback list
        urls: Vec<String> = vec!["https://api.mainnet-beta.solana.com".to_string()],

        /// Put `custom_url` in front of the list
        use_custom_rpc: bool = false,
        custom_url: String = String::new(),

        request_timeout_secs: u64 = 20,
        confirm_poll_interval_ms: u64 = 500,
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

config_struct! {
    /// Balance and token metadata cache settings
    pub struct CacheSettings {
        balance_ttl_secs: u64 = 10,
        token_metadata_ttl_secs: u64 = 3_600,
        capacity: usize = 1_000,
    }
}

// ============================================================================
// WALLET CONFIGURATION
// ============================================================================

config_struct! {
    /// Signer location
    pub struct WalletConfig {
        /// Solana CLI style JSON keypair file
        keypair_path: String = "data/wallet.json".to_string(),
    }
}

// ============================================================================
// ROOT CONFIGURATION
// ============================================================================

config_struct! {
    /// Root configuration, one TOML table per section
    pub struct Config {
        swaps: SwapsConfig = SwapsConfig::default(),
        recovery: RecoveryConfig = RecoveryConfig::default(),
        rpc: RpcConfig = RpcConfig::default(),
        cache: CacheSettings = CacheSettings::default(),
        wallet: WalletConfig = WalletConfig::default(),
    }
}

impl RpcConfig {
    /// Endpoint list in failover order
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints = Vec::with_capacity(self.urls.len() + 1);
        if self.use_custom_rpc && !self.custom_url.trim().is_empty() {
            endpoints.push(self.custom_url.trim().to_string());
        }
        for url in &self.urls {
            if !endpoints.contains(url) {
                endpoints.push(url.clone());
            }
        }
        endpoints
    }
}

impl Config {
    /// Check cross-field constraints after loading
    pub fn validate(&self) -> Result<(), String> {
        let slippage = self.swaps.slippage_percent;
        if !(0.0..=100.0).contains(&slippage) || !slippage.is_finite() {
            return Err(format!(
                "swaps.slippage_percent must be between 0 and 100, got {}",
                slippage
            ));
        }

        if self.swaps.max_price_impact_pct <= 0.0 || self.swaps.sellable_price_impact_pct <= 0.0 {
            return Err("price impact limits must be positive".to_string());
        }

        if self.recovery.max_retries == 0 {
            return Err("recovery.max_retries must be at least 1".to_string());
        }

        if self.recovery.rate_limit_cooldown_ms <= self.recovery.base_delay_ms {
            return Err(format!(
                "recovery.rate_limit_cooldown_ms ({}) must exceed recovery.base_delay_ms ({})",
                self.recovery.rate_limit_cooldown_ms, self.recovery.base_delay_ms
            ));
        }

        if self.rpc.endpoints().is_empty() {
            return Err("rpc.urls must contain at least one endpoint".to_string());
        }

        Ok(())
    }
}
