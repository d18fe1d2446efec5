/// Swap executor facade
///
/// Public entry point for the CLI. Validates requests (parameters and the
/// signer's balance), delegates to the coordinator, and turns every failure
/// into an `ErrorReport`.
use super::aggregator::AggregatorClient;
use super::builder::TransactionBuilder;
use super::coordinator::AdaptiveRetryCoordinator;
use super::quote::{QuoteOptions, QuoteProvider};
use super::signer::TransactionSigner;
use super::submitter::TransactionSubmitter;
use super::types::{Quote, Sellability, SwapOutcome, SwapRequest, TokenInfo, SOL_MINT};
use crate::cache::{BalanceKey, SwapCaches};
use crate::config::Config;
use crate::errors::{ErrorContext, ErrorReport, RecoveryEngine, SwapError};
use crate::logger::{self, LogTag};
use crate::rpc::{lamports_to_sol, ChainClient};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub struct SwapExecutor {
    coordinator: AdaptiveRetryCoordinator,
    quotes: QuoteProvider,
    aggregator: Arc<dyn AggregatorClient>,
    chain: Arc<dyn ChainClient>,
    caches: Arc<SwapCaches>,
    recovery: Arc<RecoveryEngine>,
    signer: Pubkey,
    sol_fee_reserve: u64,
}

impl SwapExecutor {
    /// Wire the full pipeline from its collaborators
    pub fn new(
        config: &Config,
        aggregator: Arc<dyn AggregatorClient>,
        chain: Arc<dyn ChainClient>,
        signer: Arc<dyn TransactionSigner>,
        recovery: Arc<RecoveryEngine>,
        caches: Arc<SwapCaches>,
    ) -> Self {
        let swaps = config.swaps.clone();
        let builder = Arc::new(TransactionBuilder::new(aggregator.clone(), swaps.clone()));
        let submitter = TransactionSubmitter::new(
            builder.clone(),
            signer.clone(),
            chain.clone(),
            Duration::from_secs(swaps.confirmation_timeout_secs),
        );
        let coordinator = AdaptiveRetryCoordinator::new(
            QuoteProvider::new(aggregator.clone(), swaps.clone()),
            builder,
            submitter,
            recovery.clone(),
            swaps.clone(),
        );

        Self {
            coordinator,
            quotes: QuoteProvider::new(aggregator.clone(), swaps.clone()),
            aggregator,
            chain,
            caches,
            recovery,
            signer: signer.signer_pubkey(),
            sol_fee_reserve: swaps.sol_fee_reserve_lamports,
        }
    }

    pub fn signer(&self) -> Pubkey {
        self.signer
    }

    /// Validate and execute a swap for the configured signer
    pub async fn execute(&self, request: SwapRequest) -> SwapOutcome {
        self.execute_as(request, "swap").await
    }

    /// Spend `lamports` SOL on `mint`, optionally overriding the configured slippage
    pub async fn buy(&self, mint: &str, lamports: u64, slippage_percent: Option<f64>) -> SwapOutcome {
        let mut request = SwapRequest::new(SOL_MINT, mint, lamports, self.signer);
        if let Some(pct) = slippage_percent {
            request = request.with_slippage(pct);
        }
        self.execute_as(request, "buy").await
    }

    /// Sell `percent` (0 < percent <= 100) of the signer's `mint` balance for SOL
    pub async fn sell(&self, mint: &str, percent: f64) -> SwapOutcome {
        let context = || ErrorContext::new("sell").with_addresses([mint.to_string()]);

        if !(percent > 0.0 && percent <= 100.0) {
            return Err(ErrorReport::from_error(
                SwapError::invalid(format!("invalid parameter: sell percent {} not in (0, 100]", percent)),
                context(),
            ));
        }

        let balance = match self.token_balance(mint).await {
            Ok(balance) => balance,
            Err(e) => return Err(ErrorReport::from_error(e, context())),
        };

        let amount = if percent >= 100.0 {
            balance
        } else {
            ((balance as f64) * percent / 100.0).floor() as u64
        };
        if amount == 0 {
            return Err(ErrorReport::from_error(
                SwapError::InsufficientBalance {
                    required: 1,
                    available: balance,
                },
                context(),
            ));
        }

        let request = SwapRequest::new(mint, SOL_MINT, amount, self.signer);
        self.execute_as(request, "sell").await
    }

    async fn execute_as(&self, request: SwapRequest, operation: &str) -> SwapOutcome {
        let context = || {
            ErrorContext::new(operation)
                .with_addresses([request.input_mint.clone(), request.output_mint.clone()])
        };

        if let Err(e) = self.validate(&request).await {
            logger::warning(LogTag::Swap, &format!("Rejected {}: {}", operation, e));
            return Err(ErrorReport::from_error(e, context()));
        }

        logger::info(
            LogTag::Swap,
            &format!(
                "{}: {} {} -> {}",
                operation, request.amount, request.input_mint, request.output_mint
            ),
        );

        let outcome = self.coordinator.execute_swap(&request).await;

        // Balances move once anything was submitted; drop them either way
        self.caches.invalidate_owner(&request.signer);

        outcome.map_err(|mut report| {
            report.context.operation = operation.to_string();
            report
        })
    }

    /// Parameter and balance checks; nothing is quoted before these pass
    async fn validate(&self, request: &SwapRequest) -> Result<(), SwapError> {
        for mint in [&request.input_mint, &request.output_mint] {
            Pubkey::from_str(mint)
                .map_err(|_| SwapError::invalid(format!("invalid mint address: {}", mint)))?;
        }
        if request.input_mint == request.output_mint {
            return Err(SwapError::invalid("invalid parameter: input and output mint are the same"));
        }
        if request.amount == 0 {
            return Err(SwapError::invalid("invalid amount: swap amount must be positive"));
        }
        if let Some(slippage) = request.slippage_percent {
            if !(0.0..=100.0).contains(&slippage) {
                return Err(SwapError::invalid(format!(
                    "invalid parameter: slippage {}% not in [0, 100]",
                    slippage
                )));
            }
        }
        if request.signer != self.signer {
            return Err(SwapError::invalid(format!(
                "invalid parameter: request signer {} is not the loaded wallet {}",
                request.signer, self.signer
            )));
        }

        if request.input_mint == SOL_MINT {
            let available = self.sol_balance().await?;
            let required = request.amount.saturating_add(self.sol_fee_reserve);
            if available < required {
                return Err(SwapError::InsufficientBalance {
                    required,
                    available,
                });
            }
        } else {
            let available = self.token_balance(&request.input_mint).await?;
            if available < request.amount {
                return Err(SwapError::InsufficientBalance {
                    required: request.amount,
                    available,
                });
            }
        }

        Ok(())
    }

    /// Quote without executing
    pub async fn quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        options: &QuoteOptions,
    ) -> Result<Quote, ErrorReport> {
        let quotes = &self.quotes;
        self.recovery
            .retry_operation("quote", move || {
                quotes.get_quote(input_mint, output_mint, amount, options)
            })
            .await
            .map_err(|e| {
                ErrorReport::from_error(
                    e,
                    ErrorContext::new("quote").with_addresses([input_mint, output_mint]),
                )
            })
    }

    pub async fn can_token_be_sold(&self, mint: &str, amount: u64) -> Result<Sellability, ErrorReport> {
        let quotes = &self.quotes;
        self.recovery
            .retry_operation("sellability", move || quotes.can_token_be_sold(mint, amount))
            .await
            .map_err(|e| {
                ErrorReport::from_error(e, ErrorContext::new("sellability").with_addresses([mint]))
            })
    }

    /// Token metadata, cached
    pub async fn token_info(&self, mint: &str) -> Result<TokenInfo, ErrorReport> {
        let key = mint.to_string();
        if let Some(info) = self.caches.tokens.get(&key) {
            logger::verbose(LogTag::Cache, &format!("Token metadata cache hit for {}", mint));
            return Ok(info);
        }

        let aggregator = &self.aggregator;
        let info = self
            .recovery
            .retry_operation("token", move || aggregator.token_info(mint))
            .await
            .map_err(|e| ErrorReport::from_error(e, ErrorContext::new("token").with_addresses([mint])))?;

        self.caches.tokens.insert(key, info.clone());
        Ok(info)
    }

    /// Signer's SOL balance in lamports, cached
    pub async fn sol_balance(&self) -> Result<u64, SwapError> {
        let key = BalanceKey::sol(self.signer);
        if let Some(lamports) = self.caches.balances.get(&key) {
            return Ok(lamports);
        }

        let (chain, signer) = (&self.chain, &self.signer);
        let lamports = self
            .recovery
            .retry_operation("get_sol_balance", move || chain.get_sol_balance(signer))
            .await?;
        logger::debug(
            LogTag::Wallet,
            &format!("SOL balance {} = {:.9}", self.signer, lamports_to_sol(lamports)),
        );

        self.caches.balances.insert(key, lamports);
        Ok(lamports)
    }

    /// Signer's raw balance of `mint`, cached
    pub async fn token_balance(&self, mint: &str) -> Result<u64, SwapError> {
        let key = BalanceKey::token(self.signer, mint);
        if let Some(amount) = self.caches.balances.get(&key) {
            return Ok(amount);
        }

        let (chain, signer) = (&self.chain, &self.signer);
        let amount = self
            .recovery
            .retry_operation("get_token_balance", move || chain.get_token_balance(signer, mint))
            .await?;
        logger::debug(
            LogTag::Wallet,
            &format!("Token balance {} of {} = {}", self.signer, mint, amount),
        );

        self.caches.balances.insert(key, amount);
        Ok(amount)
    }
}
