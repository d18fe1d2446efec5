/// JSON-RPC chain client over an ordered endpoint list
///
/// Requests go to the current endpoint only. Switching endpoints is the
/// recovery engine's decision (`EndpointFailover`), so a failed call is
/// reported, not silently retried elsewhere.
use super::ChainClient;
use crate::config::RpcConfig;
use crate::errors::{EndpointFailover, SwapError};
use crate::logger::{self, LogTag};
use crate::swaps::types::{ConfirmationStatus, SignedTransaction};
use async_trait::async_trait;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

pub struct RpcClient {
    endpoints: Vec<String>,
    current: AtomicUsize,
    request_id: AtomicU64,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl RpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, SwapError> {
        let endpoints = config.endpoints();
        if endpoints.is_empty() {
            return Err(SwapError::Config("no RPC endpoints configured".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SwapError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoints,
            current: AtomicUsize::new(0),
            request_id: AtomicU64::new(1),
            http,
            poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
        })
    }

    pub fn current_endpoint(&self) -> String {
        let index = self.current.load(Ordering::SeqCst) % self.endpoints.len();
        self.endpoints[index].clone()
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Execute one JSON-RPC call against the current endpoint
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, SwapError> {
        let body = self.post(method, params).await?;

        if let Some(error) = body.get("error") {
            return Err(SwapError::Rpc(describe_rpc_error(method, error)));
        }

        body.get("result")
            .cloned()
            .ok_or_else(|| SwapError::Rpc(format!("{} returned no result", method)))
    }

    /// POST one request and return the decoded response body
    async fn post(&self, method: &str, params: Value) -> Result<Value, SwapError> {
        let url = self.current_endpoint();
        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        logger::verbose(LogTag::Rpc, &format!("{} -> {}", method, url));

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SwapError::Http {
                status: status.as_u16(),
                endpoint: url,
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// One getSignatureStatuses lookup; None while the signature is unseen
    async fn signature_status(&self, signature: &str) -> Result<Option<Value>, SwapError> {
        let params = json!([[signature], { "searchTransactionHistory": false }]);
        let result = self.call("getSignatureStatuses", params).await?;

        Ok(result
            .get("value")
            .and_then(|v| v.as_array())
            .and_then(|values| values.first())
            .filter(|status| !status.is_null())
            .cloned())
    }
}

impl EndpointFailover for RpcClient {
    fn failover(&self) -> String {
        let next = (self.current.fetch_add(1, Ordering::SeqCst) + 1) % self.endpoints.len();
        let endpoint = self.endpoints[next].clone();
        logger::warning(LogTag::Rpc, &format!("Switched RPC endpoint to {}", endpoint));
        endpoint
    }
}

/// Interpret one signature status entry
///
/// Ok(None) means keep polling.
fn parse_signature_status(
    signature: &str,
    status: &Value,
) -> Result<Option<ConfirmationStatus>, SwapError> {
    if let Some(err) = status.get("err").filter(|e| !e.is_null()) {
        return Err(SwapError::OnChainFailure {
            signature: signature.to_string(),
            reason: err.to_string(),
        });
    }

    Ok(
        match status.get("confirmationStatus").and_then(|v| v.as_str()) {
            Some("finalized") => Some(ConfirmationStatus::Finalized),
            Some("confirmed") => Some(ConfirmationStatus::Confirmed),
            _ => None,
        },
    )
}

/// Sum the raw amounts of a getTokenAccountsByOwner jsonParsed response
fn sum_token_accounts(result: &Value) -> Result<u64, SwapError> {
    let Some(accounts) = result.get("value").and_then(|v| v.as_array()) else {
        return Ok(0);
    };

    let mut total: u64 = 0;
    for account in accounts {
        let amount = account
            .pointer("/account/data/parsed/info/tokenAmount/amount")
            .and_then(|a| a.as_str())
            .ok_or_else(|| SwapError::Parse("token account without amount".to_string()))?
            .parse::<u64>()
            .map_err(|e| SwapError::Parse(format!("Failed to parse token amount: {}", e)))?;
        total = total.saturating_add(amount);
    }
    Ok(total)
}

/// `"<method> failed: <message> [<logs>]"` from a JSON-RPC error object
///
/// Preflight failures carry program logs; they are kept for classification.
fn describe_rpc_error(method: &str, error: &Value) -> String {
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown error");
    let logs = error
        .get("data")
        .and_then(|d| d.get("logs"))
        .and_then(|l| l.as_array())
        .map(|logs| {
            logs.iter()
                .filter_map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        })
        .unwrap_or_default();

    if logs.is_empty() {
        format!("{} failed: {}", method, message)
    } else {
        format!("{} failed: {} [{}]", method, message, logs)
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn submit_transaction(&self, transaction: &SignedTransaction) -> Result<String, SwapError> {
        let params = json!([
            transaction.wire_base64,
            {
                "encoding": "base64",
                "skipPreflight": false,
                "preflightCommitment": "confirmed",
                "maxRetries": 3
            }
        ]);

        // Only an explicit JSON-RPC error proves the node refused the transaction;
        // anything else may have reached the leader
        let body = self.post("sendTransaction", params).await?;
        if let Some(error) = body.get("error") {
            return Err(SwapError::SubmitRejected(describe_rpc_error(
                "sendTransaction",
                error,
            )));
        }

        let signature = body
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| SwapError::Rpc("Invalid signature response".to_string()))?;

        logger::debug(
            LogTag::Rpc,
            &format!("Submitted {} transaction {}", transaction.format, signature),
        );
        Ok(signature.to_string())
    }

    async fn confirm_transaction(
        &self,
        signature: &str,
        timeout: Duration,
    ) -> Result<ConfirmationStatus, SwapError> {
        let started = tokio::time::Instant::now();

        loop {
            match self.signature_status(signature).await {
                Ok(Some(status)) => {
                    if let Some(confirmed) = parse_signature_status(signature, &status)? {
                        return Ok(confirmed);
                    }
                }
                Ok(None) => {}
                // A flaky status read is not a verdict on the transaction
                Err(e) => logger::debug(
                    LogTag::Rpc,
                    &format!("Status poll for {} failed: {}", signature, e),
                ),
            }

            if started.elapsed() >= timeout {
                return Err(SwapError::timeout(
                    format!("confirmation of {}", signature),
                    timeout.as_secs(),
                ));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn get_sol_balance(&self, owner: &Pubkey) -> Result<u64, SwapError> {
        let params = json!([owner.to_string(), { "commitment": "confirmed" }]);
        let result = self.call("getBalance", params).await?;

        result
            .get("value")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| SwapError::Rpc("Invalid balance response".to_string()))
    }

    async fn get_token_balance(&self, owner: &Pubkey, mint: &str) -> Result<u64, SwapError> {
        let params = json!([
            owner.to_string(),
            { "mint": mint },
            { "encoding": "jsonParsed", "commitment": "confirmed" }
        ]);
        let result = self.call("getTokenAccountsByOwner", params).await?;
        sum_token_accounts(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(urls: &[&str]) -> RpcClient {
        let config = RpcConfig {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            ..RpcConfig::default()
        };
        RpcClient::new(&config).unwrap()
    }

    #[test]
    fn test_failover_walks_the_list_and_wraps() {
        let rpc = client(&["https://a.example.org", "https://b.example.org"]);
        assert_eq!(rpc.current_endpoint(), "https://a.example.org");
        assert_eq!(rpc.failover(), "https://b.example.org");
        assert_eq!(rpc.current_endpoint(), "https://b.example.org");
        assert_eq!(rpc.failover(), "https://a.example.org");
    }

    #[test]
    fn test_custom_endpoint_goes_first() {
        let config = RpcConfig {
            urls: vec!["https://a.example.org".to_string()],
            use_custom_rpc: true,
            custom_url: "https://custom.example.org".to_string(),
            ..RpcConfig::default()
        };
        let rpc = RpcClient::new(&config).unwrap();
        assert_eq!(rpc.current_endpoint(), "https://custom.example.org");
        assert_eq!(rpc.endpoints().len(), 2);
    }

    #[test]
    fn test_empty_endpoint_list_is_a_config_error() {
        let config = RpcConfig {
            urls: vec![],
            ..RpcConfig::default()
        };
        assert!(matches!(RpcClient::new(&config), Err(SwapError::Config(_))));
    }

    #[test]
    fn test_signature_status_parsing() {
        let confirmed = json!({ "err": null, "confirmationStatus": "confirmed" });
        assert_eq!(
            parse_signature_status("sig", &confirmed).unwrap(),
            Some(ConfirmationStatus::Confirmed)
        );

        let processed = json!({ "err": null, "confirmationStatus": "processed" });
        assert_eq!(parse_signature_status("sig", &processed).unwrap(), None);

        let failed = json!({
            "err": { "InstructionError": [2, { "Custom": 6001 }] },
            "confirmationStatus": "confirmed"
        });
        match parse_signature_status("sig", &failed) {
            Err(SwapError::OnChainFailure { signature, reason }) => {
                assert_eq!(signature, "sig");
                assert!(reason.contains("InstructionError"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_token_accounts_are_summed() {
        let result = json!({
            "value": [
                { "account": { "data": { "parsed": { "info": { "tokenAmount": { "amount": "1500" } } } } } },
                { "account": { "data": { "parsed": { "info": { "tokenAmount": { "amount": "500" } } } } } }
            ]
        });
        assert_eq!(sum_token_accounts(&result).unwrap(), 2_000);
        assert_eq!(sum_token_accounts(&json!({ "value": [] })).unwrap(), 0);
    }

    #[test]
    fn test_rpc_error_keeps_preflight_logs() {
        let error = json!({
            "code": -32002,
            "message": "Transaction simulation failed",
            "data": { "logs": ["Program log: slippage exceeded", "custom program error: 0x1771"] }
        });
        assert_eq!(
            describe_rpc_error("sendTransaction", &error),
            "sendTransaction failed: Transaction simulation failed \
             [Program log: slippage exceeded; custom program error: 0x1771]"
        );
        assert_eq!(
            describe_rpc_error("getBalance", &json!({ "code": -32600 })),
            "getBalance failed: unknown error"
        );
    }
}
