/// Adaptive retry coordinator
///
/// Runs quote -> build -> submit once per level of a fixed reduction
/// schedule. Only liquidity-class failures move to the next (smaller) level;
/// everything else is returned as-is. Levels are percentages of the
/// original amount, never of the previous level.
use super::builder::{BuildOptions, TransactionBuilder};
use super::quote::{QuoteOptions, QuoteProvider};
use super::submitter::TransactionSubmitter;
use super::types::{SwapOutcome, SwapRequest, SwapResult};
use crate::config::SwapsConfig;
use crate::errors::{classify, ErrorContext, ErrorKind, ErrorReport, RecoveryEngine, SwapError};
use crate::logger::{self, LogTag};
use std::sync::Arc;

/// Percent of the original amount tried at each level
pub const REDUCTION_SCHEDULE: [u8; 3] = [100, 50, 25];

pub const REDUCTION_HINT: &str = "retry with a smaller percentage, or abandon position";

/// `percent` of `amount`, rounded down
pub fn reduced_amount(amount: u64, percent: u8) -> u64 {
    (u128::from(amount) * u128::from(percent) / 100) as u64
}

pub struct AdaptiveRetryCoordinator {
    quotes: QuoteProvider,
    builder: Arc<TransactionBuilder>,
    submitter: TransactionSubmitter,
    recovery: Arc<RecoveryEngine>,
    config: SwapsConfig,
}

impl AdaptiveRetryCoordinator {
    pub fn new(
        quotes: QuoteProvider,
        builder: Arc<TransactionBuilder>,
        submitter: TransactionSubmitter,
        recovery: Arc<RecoveryEngine>,
        config: SwapsConfig,
    ) -> Self {
        Self {
            quotes,
            builder,
            submitter,
            recovery,
            config,
        }
    }

    pub async fn execute_swap(&self, request: &SwapRequest) -> SwapOutcome {
        let addresses = [
            request.input_mint.clone(),
            request.output_mint.clone(),
            request.signer.to_string(),
        ];
        let context = |attempt: u32| {
            ErrorContext::new("swap")
                .with_addresses(addresses.iter().cloned())
                .with_attempt(attempt)
        };

        let mut last_liquidity_error: Option<(SwapError, u32)> = None;

        for (index, percent) in REDUCTION_SCHEDULE.iter().copied().enumerate() {
            let attempt = index as u32 + 1;
            let amount = reduced_amount(request.amount, percent);

            if amount == 0 {
                logger::warning(
                    LogTag::Swap,
                    &format!(
                        "{}% of {} rounds to zero, not attempting",
                        percent, request.amount
                    ),
                );
                break;
            }

            if percent < 100 {
                logger::info(
                    LogTag::Swap,
                    &format!(
                        "Retrying with {}% of the original amount ({} of {})",
                        percent, amount, request.amount
                    ),
                );
            }

            match self.run_pass(request, amount, percent).await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    let kind = classify(&error);
                    if kind != ErrorKind::Liquidity {
                        logger::error(
                            LogTag::Swap,
                            &format!("Swap failed at {}% ({}): {}", percent, kind, error),
                        );
                        return Err(ErrorReport::from_error(error, context(attempt)));
                    }

                    logger::warning(
                        LogTag::Swap,
                        &format!("Liquidity failure at {}% of original: {}", percent, error),
                    );
                    last_liquidity_error = Some((error, attempt));
                }
            }
        }

        match last_liquidity_error {
            Some((error, attempt)) => {
                logger::error(
                    LogTag::Swap,
                    &format!(
                        "Amount reduction exhausted for {} -> {}: {}",
                        request.input_mint, request.output_mint, error
                    ),
                );
                Err(ErrorReport::from_error(error, context(attempt)).with_hint(REDUCTION_HINT))
            }
            None => Err(ErrorReport::from_error(
                SwapError::invalid("invalid amount: swap amount must be positive"),
                context(1),
            )),
        }
    }

    /// One quote -> build -> submit pass for `amount`
    async fn run_pass(
        &self,
        request: &SwapRequest,
        amount: u64,
        percent: u8,
    ) -> Result<SwapResult, SwapError> {
        let prefer_optimized = request
            .prefer_optimized
            .unwrap_or(self.config.prefer_optimized);
        let quote_options = QuoteOptions {
            slippage_percent: request.slippage_percent,
            prefer_optimized: Some(prefer_optimized),
        };

        let quotes = &self.quotes;
        let quote_options = &quote_options;
        let quote = self
            .recovery
            .retry_operation("quote", move || {
                quotes.get_quote(&request.input_mint, &request.output_mint, amount, quote_options)
            })
            .await?;

        if quote.in_amount > amount {
            return Err(SwapError::invalid(format!(
                "invalid amount: quote spends {} but only {} was approved",
                quote.in_amount, amount
            )));
        }

        if quote.price_impact_pct > self.config.max_price_impact_pct {
            return Err(SwapError::PriceImpactTooHigh {
                impact_pct: quote.price_impact_pct,
                limit_pct: self.config.max_price_impact_pct,
            });
        }

        let options = BuildOptions::current(prefer_optimized);
        let builder = &self.builder;
        let quote_ref = &quote;
        let options_ref = &options;
        let payload = self
            .recovery
            .retry_operation("build", move || {
                builder.build_swap_transaction(quote_ref, &request.signer, options_ref)
            })
            .await?;

        let receipt = self.submitter.submit(payload, &quote, &options).await?;

        logger::info(
            LogTag::Swap,
            &format!(
                "Swap confirmed: {} ({} {} -> {} {}, {} format)",
                receipt.signature,
                quote.in_amount,
                request.input_mint,
                quote.out_amount,
                request.output_mint,
                receipt.format
            ),
        );

        Ok(SwapResult {
            signature: receipt.signature,
            confirmation: receipt.confirmation,
            format: receipt.format,
            generation: receipt.generation,
            requested_amount: request.amount,
            executed_amount: quote.in_amount,
            reduction_percent: percent,
            quote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduction_is_relative_to_original() {
        let amounts: Vec<u64> = REDUCTION_SCHEDULE
            .iter()
            .map(|p| reduced_amount(1_000_000, *p))
            .collect();
        assert_eq!(amounts, vec![1_000_000, 500_000, 250_000]);
    }

    #[test]
    fn test_reduction_rounds_down() {
        assert_eq!(reduced_amount(3, 50), 1);
        assert_eq!(reduced_amount(3, 25), 0);
        assert_eq!(reduced_amount(1, 50), 0);
        assert_eq!(reduced_amount(u64::MAX, 100), u64::MAX);
    }
}
