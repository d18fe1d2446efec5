/// Quote provider and sellability check
use super::aggregator::{AggregatorClient, QuoteParams};
use super::types::{Quote, Sellability, SOL_MINT};
use crate::config::SwapsConfig;
use crate::errors::{classify, ErrorKind, SwapError};
use crate::logger::{self, LogTag};
use std::sync::Arc;
use std::time::Duration;

/// Per-call quote options; `None` falls back to configuration
#[derive(Debug, Clone, Default)]
pub struct QuoteOptions {
    pub slippage_percent: Option<f64>,
    pub prefer_optimized: Option<bool>,
}

/// Slippage percent to basis points, rounded down
pub fn slippage_bps(percent: f64) -> u16 {
    let bps = (percent * 100.0).floor();
    if bps <= 0.0 || !bps.is_finite() {
        0
    } else {
        bps.min(10_000.0) as u16
    }
}

pub struct QuoteProvider {
    aggregator: Arc<dyn AggregatorClient>,
    config: SwapsConfig,
}

impl QuoteProvider {
    pub fn new(aggregator: Arc<dyn AggregatorClient>, config: SwapsConfig) -> Self {
        Self { aggregator, config }
    }

    /// Fetch a quote for `amount` smallest units of `input_mint`
    pub async fn get_quote(
        &self,
        input_mint: &str,
        output_mint: &str,
        amount: u64,
        options: &QuoteOptions,
    ) -> Result<Quote, SwapError> {
        if amount == 0 {
            return Err(SwapError::invalid("invalid amount: quote amount must be positive"));
        }

        let slippage = options
            .slippage_percent
            .unwrap_or(self.config.slippage_percent);
        let params = QuoteParams {
            input_mint: input_mint.to_string(),
            output_mint: output_mint.to_string(),
            amount,
            slippage_bps: slippage_bps(slippage),
            restrict_intermediate_tokens: options
                .prefer_optimized
                .unwrap_or(self.config.prefer_optimized),
        };

        let timeout_secs = self.config.quote_timeout_secs;
        let raw = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            self.aggregator.quote(&params),
        )
        .await
        .map_err(|_| SwapError::timeout("quote", timeout_secs))?
        .map_err(|e| match e {
            SwapError::Http { status, body, .. } => {
                SwapError::QuoteUnavailable(format!("aggregator returned HTTP {}: {}", status, body))
            }
            other => other,
        })?;

        let quote = Quote::from_response(raw, params.slippage_bps)?;
        if quote.route_plan.is_empty() {
            return Err(SwapError::QuoteUnavailable(format!(
                "no route from {} to {}",
                input_mint, output_mint
            )));
        }

        logger::debug(
            LogTag::Quote,
            &format!(
                "Quote {} {} -> {} {} impact={:.4}% route=[{}]",
                quote.in_amount,
                input_mint,
                quote.out_amount,
                output_mint,
                quote.price_impact_pct,
                quote.route_labels().join(" > ")
            ),
        );

        Ok(quote)
    }

    /// Whether `amount` of `mint` can currently be sold for SOL
    ///
    /// Routing problems are answers ("no route"); transport problems are errors.
    pub async fn can_token_be_sold(&self, mint: &str, amount: u64) -> Result<Sellability, SwapError> {
        let quote = match self
            .get_quote(mint, SOL_MINT, amount, &QuoteOptions::default())
            .await
        {
            Ok(quote) => quote,
            Err(e @ SwapError::InvalidParameter(_)) => return Err(e),
            Err(e) if matches!(e, SwapError::QuoteUnavailable(_)) || classify(&e) == ErrorKind::Liquidity => {
                logger::debug(LogTag::Quote, &format!("{} not sellable: {}", mint, e));
                return Ok(Sellability::not_sellable("no route", None));
            }
            Err(e) => return Err(e),
        };

        Ok(evaluate_sellability(&quote, self.config.sellable_price_impact_pct))
    }
}

/// Sellability verdict for a token -> SOL quote
pub fn evaluate_sellability(quote: &Quote, max_impact_pct: f64) -> Sellability {
    if quote.price_impact_pct > max_impact_pct {
        return Sellability::not_sellable("price impact too high", Some(quote.price_impact_pct));
    }
    if quote.out_amount == 0 {
        return Sellability::not_sellable("zero output", Some(quote.price_impact_pct));
    }
    Sellability::sellable(quote.out_amount, quote.price_impact_pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swaps::tests::{quote_json, FakeAggregator};

    fn provider(aggregator: Arc<FakeAggregator>) -> QuoteProvider {
        QuoteProvider::new(aggregator, SwapsConfig::default())
    }

    #[test]
    fn test_slippage_bps_is_floored() {
        assert_eq!(slippage_bps(1.0), 100);
        assert_eq!(slippage_bps(0.555), 55);
        assert_eq!(slippage_bps(2.999), 299);
        assert_eq!(slippage_bps(0.0), 0);
        assert_eq!(slippage_bps(250.0), 10_000);
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_before_network() {
        let aggregator = Arc::new(FakeAggregator::new());
        let result = provider(aggregator.clone())
            .get_quote(SOL_MINT, "mint", 0, &QuoteOptions::default())
            .await;

        assert!(matches!(result, Err(SwapError::InvalidParameter(_))));
        assert!(aggregator.quote_calls().is_empty());
    }

    #[tokio::test]
    async fn test_options_reach_the_query() {
        let aggregator = Arc::new(FakeAggregator::new());
        let options = QuoteOptions {
            slippage_percent: Some(2.5),
            prefer_optimized: Some(false),
        };
        provider(aggregator.clone())
            .get_quote(SOL_MINT, "mint", 1_000, &options)
            .await
            .unwrap();

        let calls = aggregator.quote_calls();
        assert_eq!(calls[0].slippage_bps, 250);
        assert!(!calls[0].restrict_intermediate_tokens);
    }

    #[tokio::test]
    async fn test_empty_route_is_unavailable() {
        let aggregator = Arc::new(FakeAggregator::new());
        aggregator.push_quote(Ok(serde_json::json!({
            "inputMint": SOL_MINT,
            "outputMint": "mint",
            "inAmount": "1000",
            "outAmount": "0",
            "priceImpactPct": "0",
            "routePlan": []
        })));

        let result = provider(aggregator)
            .get_quote(SOL_MINT, "mint", 1_000, &QuoteOptions::default())
            .await;
        assert!(matches!(result, Err(SwapError::QuoteUnavailable(_))));
    }

    #[tokio::test]
    async fn test_non_success_status_is_unavailable() {
        let aggregator = Arc::new(FakeAggregator::new());
        aggregator.push_quote(Err(SwapError::Http {
            status: 400,
            endpoint: "https://example.org/quote".to_string(),
            body: "{\"errorCode\":\"COULD_NOT_FIND_ANY_ROUTE\"}".to_string(),
        }));

        let err = provider(aggregator)
            .get_quote(SOL_MINT, "mint", 1_000, &QuoteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::QuoteUnavailable(_)));
        assert_eq!(classify(&err), ErrorKind::Liquidity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_aggregator_times_out() {
        let aggregator = Arc::new(FakeAggregator::new().with_quote_delay(Duration::from_secs(30)));
        let err = provider(aggregator)
            .get_quote(SOL_MINT, "mint", 1_000, &QuoteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::Timeout { seconds: 5, .. }));
    }

    #[tokio::test]
    async fn test_high_price_impact_is_never_sellable() {
        for out_amount in [0u64, 1, 5_000_000_000] {
            let aggregator = Arc::new(FakeAggregator::new());
            aggregator.push_quote(Ok(quote_json("mint", SOL_MINT, 1_000, out_amount, 10.5)));

            let verdict = provider(aggregator)
                .can_token_be_sold("mint", 1_000)
                .await
                .unwrap();
            assert!(!verdict.sellable);
            assert_eq!(verdict.reason.as_deref(), Some("price impact too high"));
        }
    }

    #[tokio::test]
    async fn test_sellable_verdicts() {
        let aggregator = Arc::new(FakeAggregator::new());
        aggregator.push_quote(Ok(quote_json("mint", SOL_MINT, 1_000, 42, 10.0)));
        let verdict = provider(aggregator.clone())
            .can_token_be_sold("mint", 1_000)
            .await
            .unwrap();
        assert!(verdict.sellable);
        assert_eq!(verdict.expected_out, Some(42));

        aggregator.push_quote(Ok(quote_json("mint", SOL_MINT, 1_000, 0, 1.0)));
        let verdict = provider(aggregator.clone())
            .can_token_be_sold("mint", 1_000)
            .await
            .unwrap();
        assert_eq!(verdict.reason.as_deref(), Some("zero output"));

        aggregator.push_quote(Err(SwapError::QuoteUnavailable("no route found".to_string())));
        let verdict = provider(aggregator)
            .can_token_be_sold("mint", 1_000)
            .await
            .unwrap();
        assert_eq!(verdict.reason.as_deref(), Some("no route"));
    }
}
