/// Recovery engine and the generic retry wrapper
///
/// `RecoveryEngine::plan` is a pure decision over (classification, attempt).
/// `recover` performs it: sleeps for backoff or cooldown, asks the endpoint
/// collaborator to fail over, and bumps the diagnostic counter for the error.
/// `retry_operation` is the only place the retry ceiling is enforced.
use super::classifier::{classify, ErrorKind};
use super::SwapError;
use crate::config::RecoveryConfig;
use crate::logger::{self, LogTag};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Sleep, then call again
    Retry { delay: Duration },
    /// Switch to the next endpoint, then call again
    RetryAfterFailover,
    /// Hand the error back to the caller
    Surface,
}

impl RecoveryAction {
    pub fn is_retry(&self) -> bool {
        !matches!(self, RecoveryAction::Surface)
    }
}

/// Connection-endpoint collaborator used for `rpc` class errors
pub trait EndpointFailover: Send + Sync {
    /// Advance to the next endpoint; returns the endpoint now in use
    fn failover(&self) -> String;
}

pub struct RecoveryEngine {
    config: RecoveryConfig,
    counters: Mutex<HashMap<String, u32>>,
    failover: Option<Arc<dyn EndpointFailover>>,
}

impl RecoveryEngine {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            config,
            counters: Mutex::new(HashMap::new()),
            failover: None,
        }
    }

    pub fn with_failover(mut self, failover: Arc<dyn EndpointFailover>) -> Self {
        self.failover = Some(failover);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Backoff for a 0-indexed network attempt: base, 2*base, 4*base, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.config.base_delay_ms.saturating_mul(factor))
    }

    /// Decide what to do about an error of `kind` on a 0-indexed attempt
    ///
    /// Liquidity errors surface here: amount reduction belongs to the
    /// coordinator, not to a same-amount retry.
    pub fn plan(&self, kind: ErrorKind, attempt: u32) -> RecoveryAction {
        match kind {
            ErrorKind::Network => RecoveryAction::Retry {
                delay: self.backoff_delay(attempt),
            },
            ErrorKind::RateLimit => RecoveryAction::Retry {
                delay: Duration::from_millis(self.config.rate_limit_cooldown_ms),
            },
            ErrorKind::Rpc => RecoveryAction::RetryAfterFailover,
            ErrorKind::Liquidity
            | ErrorKind::Validation
            | ErrorKind::OnChain
            | ErrorKind::Unknown => RecoveryAction::Surface,
        }
    }

    /// Classify, count, and carry out the recovery action for `error`
    pub async fn recover(&self, operation: &str, error: &SwapError, attempt: u32) -> RecoveryAction {
        let kind = classify(error);
        let seen = self.record(error);
        let action = self.plan(kind, attempt);

        match &action {
            RecoveryAction::Retry { delay } => {
                logger::warning(
                    LogTag::Recovery,
                    &format!(
                        "{} failed ({}), retrying in {}ms [attempt {}, seen {}x]: {}",
                        operation,
                        kind,
                        delay.as_millis(),
                        attempt + 1,
                        seen,
                        error
                    ),
                );
                tokio::time::sleep(*delay).await;
            }
            RecoveryAction::RetryAfterFailover => {
                let endpoint = self.failover.as_ref().map(|f| f.failover());
                logger::warning(
                    LogTag::Recovery,
                    &format!(
                        "{} failed ({}), switching endpoint to {} [attempt {}, seen {}x]: {}",
                        operation,
                        kind,
                        endpoint.as_deref().unwrap_or("<none configured>"),
                        attempt + 1,
                        seen,
                        error
                    ),
                );
            }
            RecoveryAction::Surface => {
                logger::debug(
                    LogTag::Recovery,
                    &format!("{} failed ({}), not retryable: {}", operation, kind, error),
                );
            }
        }

        action
    }

    /// Run `op` until it succeeds, recovery says surface, or the ceiling is hit
    ///
    /// With `max_retries = n` the operation runs at most n + 1 times. The
    /// error that hits the ceiling is returned unchanged.
    pub async fn retry_operation<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, SwapError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SwapError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= self.config.max_retries {
                        logger::error(
                            LogTag::Recovery,
                            &format!(
                                "{} gave up after {} retries: {}",
                                operation, self.config.max_retries, error
                            ),
                        );
                        return Err(error);
                    }

                    if !self.recover(operation, &error, attempt).await.is_retry() {
                        return Err(error);
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Process-lifetime failure count for an error
    pub fn attempt_count(&self, error: &SwapError) -> u32 {
        self.counters
            .lock()
            .get(&Self::counter_key(error))
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, error: &SwapError) -> u32 {
        let mut counters = self.counters.lock();
        let count = counters.entry(Self::counter_key(error)).or_insert(0);
        *count += 1;
        *count
    }

    fn counter_key(error: &SwapError) -> String {
        format!("{}:{}", error.variant_name(), error)
    }
}
