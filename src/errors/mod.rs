//! Error handling for the swap pipeline
//!
//! - `SwapError`: every failure a pipeline stage can raise
//! - `classifier`: maps a `SwapError` onto the seven-tag `ErrorKind` taxonomy
//! - `recovery`: the recovery engine and the generic retry wrapper
//! - `ErrorReport`: what a caller receives when a swap is surfaced as failed

use crate::swaps::types::TransactionFormat;
use serde::Serialize;
use thiserror::Error;

pub mod classifier;
pub mod recovery;

pub use classifier::{classify, classify_message, ErrorKind};
pub use recovery::{EndpointFailover, RecoveryAction, RecoveryEngine};

// =============================================================================
// MAIN ERROR TYPE
// =============================================================================

#[derive(Error, Debug, Clone)]
pub enum SwapError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Price impact too high: {impact_pct:.2}% exceeds limit {limit_pct:.2}%")]
    PriceImpactTooHigh { impact_pct: f64, limit_pct: f64 },

    #[error("Timeout: {operation} did not complete within {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Build failed: {0}")]
    BuildFailed(String),

    #[error("Signing failed ({format}): {message}")]
    SigningFailed {
        format: TransactionFormat,
        message: String,
    },

    #[error("Submission failed after {} attempts: {}", .attempts.len(), .attempts.join(" | "))]
    SubmissionFailed { attempts: Vec<String> },

    /// The node answered `sendTransaction` with a JSON-RPC error; nothing landed
    #[error("Submission rejected: {0}")]
    SubmitRejected(String),

    #[error("Confirmation unknown for {signature}: {message}")]
    ConfirmationUnknown { signature: String, message: String },

    #[error("Transaction {signature} failed on chain: {reason}")]
    OnChainFailure { signature: String, reason: String },

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u64, available: u64 },

    #[error("HTTP {status} from {endpoint}: {body}")]
    Http {
        status: u16,
        endpoint: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl SwapError {
    /// Stable variant name, half of the recovery counter key
    pub fn variant_name(&self) -> &'static str {
        match self {
            SwapError::InvalidParameter(_) => "InvalidParameter",
            SwapError::QuoteUnavailable(_) => "QuoteUnavailable",
            SwapError::PriceImpactTooHigh { .. } => "PriceImpactTooHigh",
            SwapError::Timeout { .. } => "Timeout",
            SwapError::BuildFailed(_) => "BuildFailed",
            SwapError::SigningFailed { .. } => "SigningFailed",
            SwapError::SubmissionFailed { .. } => "SubmissionFailed",
            SwapError::SubmitRejected(_) => "SubmitRejected",
            SwapError::ConfirmationUnknown { .. } => "ConfirmationUnknown",
            SwapError::OnChainFailure { .. } => "OnChainFailure",
            SwapError::InsufficientBalance { .. } => "InsufficientBalance",
            SwapError::Http { .. } => "Http",
            SwapError::Network(_) => "Network",
            SwapError::Rpc(_) => "Rpc",
            SwapError::Config(_) => "Config",
            SwapError::Parse(_) => "Parse",
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        SwapError::InvalidParameter(message.into())
    }

    pub fn timeout(operation: impl Into<String>, seconds: u64) -> Self {
        SwapError::Timeout {
            operation: operation.into(),
            seconds,
        }
    }
}

impl From<reqwest::Error> for SwapError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SwapError::Network(format!("request timeout: {}", err))
        } else if let Some(status) = err.status() {
            SwapError::Http {
                status: status.as_u16(),
                endpoint: err.url().map(|u| u.to_string()).unwrap_or_default(),
                body: err.to_string(),
            }
        } else {
            SwapError::Network(format!("HTTP request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for SwapError {
    fn from(err: serde_json::Error) -> Self {
        SwapError::Parse(format!("JSON: {}", err))
    }
}

// =============================================================================
// ERROR REPORT
// =============================================================================

/// Where a surfaced failure came from
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorContext {
    /// Operation name ("quote", "buy", "sell", "swap", ...)
    pub operation: String,
    /// Mints and wallet addresses involved
    pub addresses: Vec<String>,
    /// 1-based pass number within the amount-reduction schedule
    pub attempt: u32,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

/// Failure half of a swap outcome
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    pub context: ErrorContext,
    /// Remediation advice for the operator
    pub hint: Option<String>,
    #[serde(skip_serializing)]
    pub error: SwapError,
}

impl ErrorReport {
    pub fn from_error(error: SwapError, context: ErrorContext) -> Self {
        let kind = classify(&error);
        Self {
            kind,
            message: error.to_string(),
            retryable: kind.is_retryable(),
            context,
            hint: None,
            error,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Short sentence for the operator instead of the raw error
    pub fn user_message(&self) -> String {
        let label = match self.context.operation.as_str() {
            "quote" => "Quote",
            "buy" => "Buy",
            "sell" => "Sell",
            "sellability" => "Sellability check",
            "token" => "Token lookup",
            _ => "Swap",
        };

        let sentence = match self.kind {
            ErrorKind::Liquidity => format!(
                "{} failed: not enough liquidity for this amount. Retry with a smaller percentage, or abandon the position.",
                label
            ),
            ErrorKind::Network | ErrorKind::Rpc => format!(
                "{} failed: the network or RPC endpoint is not responding. Please try again shortly.",
                label
            ),
            ErrorKind::RateLimit => format!(
                "{} failed: the swap service is rate limiting requests. Please wait a moment and try again.",
                label
            ),
            ErrorKind::Validation => format!(
                "{} rejected. Please check the token, the amount and your balance.",
                label
            ),
            ErrorKind::OnChain => format!(
                "{} transaction failed. Please check your balance and try again.",
                label
            ),
            ErrorKind::Unknown => format!(
                "{} failed unexpectedly. See the log for details.",
                label
            ),
        };

        sentence
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} (operation={}, attempt={})",
            self.kind.as_str(),
            self.message,
            self.context.operation,
            self.context.attempt
        )
    }
}

impl std::error::Error for ErrorReport {}
