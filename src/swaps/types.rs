/// Common swap structures and types shared by the pipeline stages
use crate::errors::{ErrorReport, SwapError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

/// Wrapped SOL mint, used as the SOL side of every buy and sell
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Custom deserializer for integer amounts sent either as string or number
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer amount as string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<u64, E>
        where
            E: de::Error,
        {
            value.trim().parse::<u64>().map_err(E::custom)
        }

        fn visit_u64<E>(self, value: u64) -> Result<u64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<u64, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

/// Custom deserializer for decimals sent either as string or number
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a decimal as string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<f64, E>
        where
            E: de::Error,
        {
            value.trim().parse::<f64>().map_err(E::custom)
        }

        fn visit_f64<E>(self, value: f64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(value as f64)
        }

        fn visit_i64<E>(self, value: i64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(value as f64)
        }

        fn visit_unit<E>(self) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(0.0)
        }
    }

    deserializer.deserialize_any(DecimalVisitor)
}

// =============================================================================
// FORMAT AND GENERATION TAGS
// =============================================================================

/// Chain-level transaction encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionFormat {
    Versioned,
    Legacy,
}

impl TransactionFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionFormat::Versioned => "versioned",
            TransactionFormat::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for TransactionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregator API generation a transaction was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiGeneration {
    Current,
    Legacy,
}

impl ApiGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiGeneration::Current => "current",
            ApiGeneration::Legacy => "legacy",
        }
    }
}

impl std::fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// QUOTE
// =============================================================================

/// Fields of the aggregator quote response the pipeline consumes
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "inputMint")]
    input_mint: String,
    #[serde(rename = "outputMint")]
    output_mint: String,
    #[serde(rename = "inAmount", deserialize_with = "deserialize_amount")]
    in_amount: u64,
    #[serde(rename = "outAmount", deserialize_with = "deserialize_amount")]
    out_amount: u64,
    #[serde(
        rename = "priceImpactPct",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    price_impact_pct: f64,
    #[serde(rename = "routePlan", default)]
    route_plan: Vec<Value>,
    #[serde(rename = "slippageBps", default)]
    slippage_bps: Option<u16>,
}

/// A priced route for a fixed input amount
///
/// Immutable once returned. `raw` is the aggregator's own JSON, which the
/// build request must echo back unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Percent, as reported by the aggregator
    pub price_impact_pct: f64,
    pub route_plan: Vec<Value>,
    pub slippage_bps: u16,
    #[serde(skip_serializing)]
    pub raw: Value,
}

impl Quote {
    /// Parse an aggregator quote response
    ///
    /// `requested_bps` fills in slippage when the response omits it.
    pub fn from_response(raw: Value, requested_bps: u16) -> Result<Self, SwapError> {
        let parsed: QuoteResponse = serde_json::from_value(raw.clone())
            .map_err(|e| SwapError::Parse(format!("quote response: {}", e)))?;

        Ok(Self {
            input_mint: parsed.input_mint,
            output_mint: parsed.output_mint,
            in_amount: parsed.in_amount,
            out_amount: parsed.out_amount,
            price_impact_pct: parsed.price_impact_pct,
            route_plan: parsed.route_plan,
            slippage_bps: parsed.slippage_bps.unwrap_or(requested_bps),
            raw,
        })
    }

    /// Route labels, for logging
    pub fn route_labels(&self) -> Vec<String> {
        self.route_plan
            .iter()
            .filter_map(|hop| hop.get("swapInfo")?.get("label")?.as_str())
            .map(str::to_string)
            .collect()
    }
}

// =============================================================================
// REQUEST AND PAYLOAD
// =============================================================================

/// One user swap intent, not persisted
#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Smallest units of the input mint
    pub amount: u64,
    pub signer: Pubkey,
    /// Overrides the configured slippage (percent)
    pub slippage_percent: Option<f64>,
    /// Overrides the configured optimized-transaction preference
    pub prefer_optimized: Option<bool>,
}

impl SwapRequest {
    pub fn new(
        input_mint: impl Into<String>,
        output_mint: impl Into<String>,
        amount: u64,
        signer: Pubkey,
    ) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            amount,
            signer,
            slippage_percent: None,
            prefer_optimized: None,
        }
    }

    pub fn with_slippage(mut self, percent: f64) -> Self {
        self.slippage_percent = Some(percent);
        self
    }

}

/// Serialized unsigned transaction as returned by the aggregator
#[derive(Debug, Clone)]
pub struct UnsignedTransactionPayload {
    pub bytes: Vec<u8>,
    pub format: TransactionFormat,
    pub generation: ApiGeneration,
    pub last_valid_block_height: Option<u64>,
}

/// Signed transaction ready for the chain client
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub format: TransactionFormat,
    /// Base58 fee-payer signature
    pub signature: String,
    /// Base64 wire encoding
    pub wire_base64: String,
}

/// Aggregator swap endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct SwapTransactionResponse {
    #[serde(rename = "swapTransaction")]
    pub swap_transaction: String,
    #[serde(rename = "lastValidBlockHeight", default)]
    pub last_valid_block_height: Option<u64>,
}

// =============================================================================
// RESULTS
// =============================================================================

/// Commitment reached by a landed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Confirmed,
    Finalized,
}

/// Successful swap
#[derive(Debug, Clone, Serialize)]
pub struct SwapResult {
    pub signature: String,
    /// Quote of the pass that landed
    pub quote: Quote,
    pub confirmation: ConfirmationStatus,
    pub format: TransactionFormat,
    pub generation: ApiGeneration,
    pub requested_amount: u64,
    pub executed_amount: u64,
    /// Percentage of the requested amount that was executed (100, 50 or 25)
    pub reduction_percent: u8,
}

impl SwapResult {
    pub fn was_reduced(&self) -> bool {
        self.reduction_percent < 100
    }
}

/// Tagged outcome of one swap request
pub type SwapOutcome = Result<SwapResult, ErrorReport>;

/// Result of the sellability check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sellability {
    pub sellable: bool,
    pub reason: Option<String>,
    pub expected_out: Option<u64>,
    pub price_impact_pct: Option<f64>,
}

impl Sellability {
    pub fn sellable(expected_out: u64, price_impact_pct: f64) -> Self {
        Self {
            sellable: true,
            reason: None,
            expected_out: Some(expected_out),
            price_impact_pct: Some(price_impact_pct),
        }
    }

    pub fn not_sellable(reason: impl Into<String>, price_impact_pct: Option<f64>) -> Self {
        Self {
            sellable: false,
            reason: Some(reason.into()),
            expected_out: None,
            price_impact_pct,
        }
    }
}

/// Token metadata from the aggregator token endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(alias = "id", alias = "address")]
    pub mint: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub decimals: u8,
    #[serde(rename = "usdPrice", default)]
    pub usd_price: Option<f64>,
    #[serde(alias = "icon", alias = "logoURI", default)]
    pub logo_uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quote_parses_string_amounts() {
        let raw = json!({
            "inputMint": SOL_MINT,
            "outputMint": "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
            "inAmount": "1000000",
            "outAmount": "35123456789",
            "otherAmountThreshold": "34772222221",
            "priceImpactPct": "0.12",
            "slippageBps": 100,
            "routePlan": [{"swapInfo": {"label": "Raydium"}, "percent": 100}]
        });

        let quote = Quote::from_response(raw.clone(), 50).unwrap();
        assert_eq!(quote.in_amount, 1_000_000);
        assert_eq!(quote.out_amount, 35_123_456_789);
        assert_eq!(quote.price_impact_pct, 0.12);
        assert_eq!(quote.slippage_bps, 100);
        assert_eq!(quote.route_labels(), vec!["Raydium".to_string()]);
        assert_eq!(quote.raw, raw);
    }

    #[test]
    fn test_quote_accepts_numeric_fields_and_defaults_slippage() {
        let raw = json!({
            "inputMint": "a",
            "outputMint": "b",
            "inAmount": 10,
            "outAmount": 20,
            "priceImpactPct": 12.5
        });
        let quote = Quote::from_response(raw, 75).unwrap();
        assert_eq!(quote.slippage_bps, 75);
        assert_eq!(quote.price_impact_pct, 12.5);
        assert!(quote.route_plan.is_empty());
    }

    #[test]
    fn test_quote_rejects_garbage_amount() {
        let raw = json!({
            "inputMint": "a",
            "outputMint": "b",
            "inAmount": "ten",
            "outAmount": "20"
        });
        assert!(matches!(
            Quote::from_response(raw, 50),
            Err(SwapError::Parse(_))
        ));
    }

    #[test]
    fn test_token_info_aliases() {
        let info: TokenInfo = serde_json::from_value(json!({
            "id": "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
            "symbol": "Bonk",
            "name": "Bonk",
            "decimals": 5,
            "icon": "https://example.org/bonk.png",
            "usdPrice": 0.0000214
        }))
        .unwrap();
        assert_eq!(info.decimals, 5);
        assert_eq!(info.logo_uri.as_deref(), Some("https://example.org/bonk.png"));
    }
}
