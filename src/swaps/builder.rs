/// Transaction builder
///
/// Turns a quote into an unsigned, serialized swap transaction. The
/// minimum-output field is always derived from the quote so slippage is
/// enforced by the aggregator program, not by this process.
use super::aggregator::AggregatorClient;
use super::types::{ApiGeneration, Quote, TransactionFormat, UnsignedTransactionPayload};
use crate::config::SwapsConfig;
use crate::errors::SwapError;
use crate::logger::{self, LogTag};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;

/// Shape of one build request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub generation: ApiGeneration,
    pub format: TransactionFormat,
    pub prefer_optimized: bool,
}

impl BuildOptions {
    pub fn current(prefer_optimized: bool) -> Self {
        Self {
            generation: ApiGeneration::Current,
            format: TransactionFormat::Versioned,
            prefer_optimized,
        }
    }
}

/// Lowest acceptable output: `floor(out_amount * (10000 - bps) / 10000)`
pub fn min_output_amount(quote: &Quote) -> u64 {
    let bps = u128::from(quote.slippage_bps.min(10_000));
    (u128::from(quote.out_amount) * (10_000 - bps) / 10_000) as u64
}

pub struct TransactionBuilder {
    aggregator: Arc<dyn AggregatorClient>,
    config: SwapsConfig,
}

impl TransactionBuilder {
    pub fn new(aggregator: Arc<dyn AggregatorClient>, config: SwapsConfig) -> Self {
        Self { aggregator, config }
    }

    /// Request body for the given generation
    pub fn request_body(&self, quote: &Quote, signer: &Pubkey, options: &BuildOptions) -> Value {
        let threshold = min_output_amount(quote).to_string();
        let as_legacy = options.format == TransactionFormat::Legacy;

        match options.generation {
            ApiGeneration::Current => json!({
                "quoteResponse": quote.raw,
                "userPublicKey": signer.to_string(),
                "wrapAndUnwrapSol": true,
                "otherAmountThreshold": threshold,
                "dynamicComputeUnitLimit": options.prefer_optimized,
                "useSharedAccounts": options.prefer_optimized,
                "computeUnitPriceMicroLamports": self.config.priority_fee_micro_lamports,
                "asLegacyTransaction": as_legacy,
            }),
            // Older shape: no optimization flags, older SOL wrapping key
            ApiGeneration::Legacy => json!({
                "quoteResponse": quote.raw,
                "userPublicKey": signer.to_string(),
                "wrapUnwrapSOL": true,
                "otherAmountThreshold": threshold,
                "computeUnitPriceMicroLamports": self.config.priority_fee_micro_lamports,
                "asLegacyTransaction": as_legacy,
            }),
        }
    }

    pub async fn build_swap_transaction(
        &self,
        quote: &Quote,
        signer: &Pubkey,
        options: &BuildOptions,
    ) -> Result<UnsignedTransactionPayload, SwapError> {
        let body = self.request_body(quote, signer, options);
        let timeout_secs = self.config.build_timeout_secs;

        logger::debug(
            LogTag::Transaction,
            &format!(
                "Building {} transaction via {} API (min out {})",
                options.format,
                options.generation,
                min_output_amount(quote)
            ),
        );

        let response = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.aggregator.swap_transaction(&body, options.generation),
        )
        .await
        .map_err(|_| SwapError::timeout("build", timeout_secs))?
        .map_err(|e| match e {
            SwapError::Http { status, body, .. } => {
                SwapError::BuildFailed(format!("aggregator returned HTTP {}: {}", status, body))
            }
            SwapError::Parse(message) => SwapError::BuildFailed(message),
            other => other,
        })?;

        if response.swap_transaction.is_empty() {
            return Err(SwapError::BuildFailed(
                "aggregator returned an empty transaction".to_string(),
            ));
        }

        let bytes = general_purpose::STANDARD
            .decode(response.swap_transaction.trim())
            .map_err(|e| SwapError::BuildFailed(format!("transaction is not base64: {}", e)))?;

        Ok(UnsignedTransactionPayload {
            bytes,
            format: options.format,
            generation: options.generation,
            last_valid_block_height: response.last_valid_block_height,
        })
    }
}
