/// Error classification into the recovery taxonomy
///
/// Structured variants are classified directly; everything else goes through
/// a case-insensitive substring table. Table order matters: the first group
/// with a matching pattern wins, so liquidity codes embedded in RPC or
/// submission messages are still recognised as liquidity.
use super::SwapError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    RateLimit,
    Rpc,
    Liquidity,
    Validation,
    OnChain,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Rpc => "rpc",
            ErrorKind::Liquidity => "liquidity",
            ErrorKind::Validation => "validation",
            ErrorKind::OnChain => "on_chain",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Whether trying again later (or smaller) can change the outcome
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimit | ErrorKind::Rpc | ErrorKind::Liquidity
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregator liquidity error codes and phrases.
/// 0x1771 is the aggregator program's SlippageToleranceExceeded (6001).
const LIQUIDITY_PATTERNS: &[&str] = &[
    "insufficient liquidity",
    "price impact too high",
    "slippage exceeded",
    "slippage tolerance exceeded",
    "slippagetoleranceexceeded",
    "0x1771",
    "could_not_find_any_route",
    "no_routes_found",
    "no route",
];

/// Status codes are matched with their prefix so amounts such as 14290000 do not match
const RATE_LIMIT_PATTERNS: &[&str] = &["http 429", "status 429", "too many requests", "rate limit"];

const VALIDATION_PATTERNS: &[&str] = &[
    "invalid parameter",
    "invalid amount",
    "invalid mint",
    "insufficient funds",
    "insufficient lamports",
    "insufficient balance",
];

const NETWORK_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "network",
    "econnreset",
    "socket hang up",
    "http 502",
    "http 503",
    "http 504",
];

const RPC_PATTERNS: &[&str] = &["rpc", "connection", "blockhash not found", "node is behind"];

const ON_CHAIN_PATTERNS: &[&str] = &["instructionerror", "custom program error"];

const PATTERN_TABLE: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::Liquidity, LIQUIDITY_PATTERNS),
    (ErrorKind::RateLimit, RATE_LIMIT_PATTERNS),
    (ErrorKind::Validation, VALIDATION_PATTERNS),
    (ErrorKind::Network, NETWORK_PATTERNS),
    (ErrorKind::Rpc, RPC_PATTERNS),
    (ErrorKind::OnChain, ON_CHAIN_PATTERNS),
];

/// Classify a free-form error message
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();

    PATTERN_TABLE
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| lower.contains(p)))
        .map(|(kind, _)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Classify a pipeline error
pub fn classify(error: &SwapError) -> ErrorKind {
    match error {
        SwapError::InvalidParameter(_)
        | SwapError::InsufficientBalance { .. }
        | SwapError::Config(_) => ErrorKind::Validation,
        SwapError::OnChainFailure { .. } => ErrorKind::OnChain,
        SwapError::PriceImpactTooHigh { .. } => ErrorKind::Liquidity,
        SwapError::Timeout { .. } => ErrorKind::Network,
        SwapError::Http { status: 429, .. } => ErrorKind::RateLimit,
        // Outcome unknown after a successful submit: never safe to resend
        SwapError::ConfirmationUnknown { .. } => ErrorKind::Unknown,
        other => classify_message(&other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_table() {
        assert_eq!(classify_message("Request TIMEOUT after 5s"), ErrorKind::Network);
        assert_eq!(classify_message("network unreachable"), ErrorKind::Network);
        assert_eq!(classify_message("status 429"), ErrorKind::RateLimit);
        assert_eq!(classify_message("Rate limit reached"), ErrorKind::RateLimit);
        assert_eq!(classify_message("RPC node returned garbage"), ErrorKind::Rpc);
        assert_eq!(classify_message("connection reset by peer"), ErrorKind::Rpc);
        assert_eq!(
            classify_message("Insufficient liquidity for this trade"),
            ErrorKind::Liquidity
        );
        assert_eq!(classify_message("Price impact too high"), ErrorKind::Liquidity);
        assert_eq!(classify_message("Slippage exceeded"), ErrorKind::Liquidity);
        assert_eq!(
            classify_message("Program log: custom program error: 0x1771"),
            ErrorKind::Liquidity
        );
        assert_eq!(classify_message("COULD_NOT_FIND_ANY_ROUTE"), ErrorKind::Liquidity);
        assert_eq!(classify_message("something odd"), ErrorKind::Unknown);
    }

    #[test]
    fn test_structured_variants() {
        assert_eq!(
            classify(&SwapError::invalid("amount must be positive")),
            ErrorKind::Validation
        );
        assert_eq!(
            classify(&SwapError::InsufficientBalance {
                required: 10,
                available: 1
            }),
            ErrorKind::Validation
        );
        assert_eq!(
            classify(&SwapError::OnChainFailure {
                signature: "sig".to_string(),
                reason: "custom program error: 0x1771".to_string(),
            }),
            ErrorKind::OnChain
        );
        assert_eq!(
            classify(&SwapError::PriceImpactTooHigh {
                impact_pct: 12.0,
                limit_pct: 10.0
            }),
            ErrorKind::Liquidity
        );
        assert_eq!(classify(&SwapError::timeout("quote", 5)), ErrorKind::Network);
        assert_eq!(
            classify(&SwapError::Http {
                status: 429,
                endpoint: "https://example.org".to_string(),
                body: String::new(),
            }),
            ErrorKind::RateLimit
        );
    }

    #[test]
    fn test_wrapped_messages_are_classified_by_content() {
        assert_eq!(
            classify(&SwapError::QuoteUnavailable(
                "aggregator returned HTTP 429: slow down".to_string()
            )),
            ErrorKind::RateLimit
        );
        assert_eq!(
            classify(&SwapError::QuoteUnavailable("no route found".to_string())),
            ErrorKind::Liquidity
        );
        assert_eq!(
            classify(&SwapError::Rpc("getBalance failed".to_string())),
            ErrorKind::Rpc
        );
        assert_eq!(
            classify(&SwapError::Network("dns failure".to_string())),
            ErrorKind::Network
        );
        assert_eq!(
            classify(&SwapError::ConfirmationUnknown {
                signature: "sig".to_string(),
                message: "RPC timeout".to_string(),
            }),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn test_amounts_containing_429_are_not_rate_limits() {
        assert_eq!(
            classify(&SwapError::BuildFailed(
                "aggregator returned HTTP 400: quote inAmount 14290000 does not match".to_string()
            )),
            ErrorKind::Unknown
        );
        assert_eq!(
            classify_message("expected out 4290 below threshold"),
            ErrorKind::Unknown
        );
        assert_eq!(classify_message("HTTP 429 from https://rpc.example.org"), ErrorKind::RateLimit);
    }

    #[test]
    fn test_tags() {
        assert_eq!(ErrorKind::RateLimit.as_str(), "rate_limit");
        assert_eq!(ErrorKind::OnChain.to_string(), "on_chain");
        assert!(ErrorKind::Network.is_retryable());
        assert!(!ErrorKind::Validation.is_retryable());
        assert!(!ErrorKind::Unknown.is_retryable());
    }
}
