/// Aggregator HTTP surface
///
/// `AggregatorClient` is the seam the quote provider and transaction builder
/// talk to; `JupiterClient` is the production implementation over two API
/// generations that share the same quote and swap shapes but live under
/// different base URLs.
use super::types::{ApiGeneration, SwapTransactionResponse, TokenInfo};
use crate::config::SwapsConfig;
use crate::errors::SwapError;
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Query parameters for one quote request
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteParams {
    pub input_mint: String,
    pub output_mint: String,
    pub amount: u64,
    pub slippage_bps: u16,
    /// Ask for routes that avoid exotic intermediate tokens
    pub restrict_intermediate_tokens: bool,
}

impl QuoteParams {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("inputMint", self.input_mint.clone()),
            ("outputMint", self.output_mint.clone()),
            ("amount", self.amount.to_string()),
            ("slippageBps", self.slippage_bps.to_string()),
            ("swapMode", "ExactIn".to_string()),
        ];
        if self.restrict_intermediate_tokens {
            params.push(("restrictIntermediateTokens", "true".to_string()));
        }
        params
    }
}

#[async_trait]
pub trait AggregatorClient: Send + Sync {
    /// Raw quote JSON for the given parameters
    async fn quote(&self, params: &QuoteParams) -> Result<Value, SwapError>;

    /// Serialized unsigned transaction for a swap request body
    async fn swap_transaction(
        &self,
        body: &Value,
        generation: ApiGeneration,
    ) -> Result<SwapTransactionResponse, SwapError>;

    /// Token metadata for one mint
    async fn token_info(&self, mint: &str) -> Result<TokenInfo, SwapError>;
}

pub struct JupiterClient {
    config: SwapsConfig,
    client: Client,
}

impl JupiterClient {
    pub fn new(config: SwapsConfig) -> Result<Self, SwapError> {
        // Per-call bounds are applied by the pipeline; this is a backstop
        let client = Client::builder()
            .timeout(Duration::from_secs(config.build_timeout_secs.max(30)))
            .build()
            .map_err(|e| SwapError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn base_url(&self, generation: ApiGeneration) -> &str {
        match generation {
            ApiGeneration::Current => self.config.current_api_url.trim_end_matches('/'),
            ApiGeneration::Legacy => self.config.legacy_api_url.trim_end_matches('/'),
        }
    }

    /// Turn a non-success response into `SwapError::Http`, keeping the body
    async fn check_status(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<reqwest::Response, SwapError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SwapError::Http {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
            body,
        })
    }
}

#[async_trait]
impl AggregatorClient for JupiterClient {
    async fn quote(&self, params: &QuoteParams) -> Result<Value, SwapError> {
        let url = format!("{}/quote", self.base_url(ApiGeneration::Current));
        logger::debug(
            LogTag::Quote,
            &format!(
                "GET {} {} -> {} amount={} slippageBps={}",
                url, params.input_mint, params.output_mint, params.amount, params.slippage_bps
            ),
        );

        let response = self.client.get(&url).query(&params.to_query()).send().await?;
        let response = Self::check_status(response, &url).await?;
        Ok(response.json::<Value>().await?)
    }

    async fn swap_transaction(
        &self,
        body: &Value,
        generation: ApiGeneration,
    ) -> Result<SwapTransactionResponse, SwapError> {
        let url = format!("{}/swap", self.base_url(generation));
        logger::debug(
            LogTag::Transaction,
            &format!("POST {} ({} generation)", url, generation),
        );

        let response = self.client.post(&url).json(body).send().await?;
        let response = Self::check_status(response, &url).await?;
        let value: Value = response.json().await?;

        serde_json::from_value::<SwapTransactionResponse>(value)
            .map_err(|e| SwapError::Parse(format!("swap response: {}", e)))
    }

    async fn token_info(&self, mint: &str) -> Result<TokenInfo, SwapError> {
        let url = format!("{}/search", self.config.token_api_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[("query", mint)])
            .send()
            .await?;
        let response = Self::check_status(response, &url).await?;
        let tokens: Vec<TokenInfo> = response.json().await?;

        tokens
            .into_iter()
            .find(|token| token.mint == mint)
            .ok_or_else(|| SwapError::invalid(format!("invalid mint: {} is not a known token", mint)))
    }
}
