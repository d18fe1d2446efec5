/// Transaction submitter: the format fallback ladder
///
/// Strategies run strictly in order, each at most once:
///
/// 1. `versioned`       sign the built payload as a versioned transaction
/// 2. `legacy`          sign the same payload as a legacy transaction
/// 3. `legacy-rebuilt`  rebuild through the older API generation, sign as legacy
///
/// Decode, sign and build failures move to the next strategy, and so does an
/// explicit `SubmitRejected` from the node. Any other submit error leaves the
/// send in doubt and ends the ladder as `ConfirmationUnknown`. Once a
/// transaction is accepted the ladder is also over: a chain-reported failure
/// is `OnChainFailure`, anything else is `ConfirmationUnknown`. Sending
/// another format at that point could execute the swap twice.
use super::builder::{BuildOptions, TransactionBuilder};
use super::signer::TransactionSigner;
use super::types::{
    ApiGeneration, ConfirmationStatus, Quote, TransactionFormat, UnsignedTransactionPayload,
};
use crate::errors::SwapError;
use crate::logger::{self, LogTag};
use crate::rpc::ChainClient;
use std::sync::Arc;
use std::time::Duration;

/// One rung of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitStrategy {
    pub label: &'static str,
    pub format: TransactionFormat,
    /// Rebuild through this generation instead of reusing the built payload
    pub rebuild: Option<ApiGeneration>,
}

pub const SUBMIT_LADDER: [SubmitStrategy; 3] = [
    SubmitStrategy {
        label: "versioned",
        format: TransactionFormat::Versioned,
        rebuild: None,
    },
    SubmitStrategy {
        label: "legacy",
        format: TransactionFormat::Legacy,
        rebuild: None,
    },
    SubmitStrategy {
        label: "legacy-rebuilt",
        format: TransactionFormat::Legacy,
        rebuild: Some(ApiGeneration::Legacy),
    },
];

/// A transaction that landed
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub signature: String,
    pub format: TransactionFormat,
    pub generation: ApiGeneration,
    pub confirmation: ConfirmationStatus,
    pub strategy: &'static str,
}

pub struct TransactionSubmitter {
    builder: Arc<TransactionBuilder>,
    signer: Arc<dyn TransactionSigner>,
    chain: Arc<dyn ChainClient>,
    confirmation_timeout: Duration,
}

impl TransactionSubmitter {
    pub fn new(
        builder: Arc<TransactionBuilder>,
        signer: Arc<dyn TransactionSigner>,
        chain: Arc<dyn ChainClient>,
        confirmation_timeout: Duration,
    ) -> Self {
        Self {
            builder,
            signer,
            chain,
            confirmation_timeout,
        }
    }

    /// Run the ladder for a built payload
    ///
    /// `options` is what `payload` was built with; rebuilt rungs keep its
    /// optimization preference.
    pub async fn submit(
        &self,
        payload: UnsignedTransactionPayload,
        quote: &Quote,
        options: &BuildOptions,
    ) -> Result<SubmissionReceipt, SwapError> {
        let signer_pubkey = self.signer.signer_pubkey();
        let mut failures: Vec<String> = Vec::with_capacity(SUBMIT_LADDER.len());

        for strategy in SUBMIT_LADDER.iter() {
            logger::debug(
                LogTag::Transaction,
                &format!("Ladder step '{}' ({} format)", strategy.label, strategy.format),
            );

            let rebuilt;
            let (bytes, generation) = match strategy.rebuild {
                None => (payload.bytes.as_slice(), payload.generation),
                Some(generation) => {
                    let rebuild_options = BuildOptions {
                        generation,
                        format: strategy.format,
                        prefer_optimized: options.prefer_optimized,
                    };
                    match self
                        .builder
                        .build_swap_transaction(quote, &signer_pubkey, &rebuild_options)
                        .await
                    {
                        Ok(p) => {
                            rebuilt = p;
                            (rebuilt.bytes.as_slice(), generation)
                        }
                        Err(e) => {
                            self.record_failure(&mut failures, strategy, &e);
                            continue;
                        }
                    }
                }
            };

            let signed = match self.signer.sign_payload(bytes, strategy.format) {
                Ok(signed) => signed,
                Err(e) => {
                    self.record_failure(&mut failures, strategy, &e);
                    continue;
                }
            };

            let signature = match self.chain.submit_transaction(&signed).await {
                Ok(signature) => signature,
                Err(e @ SwapError::SubmitRejected(_)) => {
                    self.record_failure(&mut failures, strategy, &e);
                    continue;
                }
                Err(e) => {
                    // The send may still have reached the leader
                    logger::error(
                        LogTag::Transaction,
                        &format!("Submission of {} inconclusive: {}", signed.signature, e),
                    );
                    return Err(SwapError::ConfirmationUnknown {
                        signature: signed.signature,
                        message: e.to_string(),
                    });
                }
            };

            logger::info(
                LogTag::Transaction,
                &format!(
                    "Submitted {} ({} format, {} API), awaiting confirmation",
                    signature, strategy.format, generation
                ),
            );

            return match self
                .chain
                .confirm_transaction(&signature, self.confirmation_timeout)
                .await
            {
                Ok(confirmation) => Ok(SubmissionReceipt {
                    signature,
                    format: strategy.format,
                    generation,
                    confirmation,
                    strategy: strategy.label,
                }),
                Err(e @ SwapError::OnChainFailure { .. }) => {
                    logger::error(LogTag::Transaction, &format!("{}", e));
                    Err(e)
                }
                Err(e) => {
                    logger::error(
                        LogTag::Transaction,
                        &format!("Confirmation of {} inconclusive: {}", signature, e),
                    );
                    Err(SwapError::ConfirmationUnknown {
                        signature,
                        message: e.to_string(),
                    })
                }
            };
        }

        Err(SwapError::SubmissionFailed { attempts: failures })
    }

    fn record_failure(&self, failures: &mut Vec<String>, strategy: &SubmitStrategy, error: &SwapError) {
        logger::warning(
            LogTag::Transaction,
            &format!("Ladder step '{}' failed: {}", strategy.label, error),
        );
        failures.push(format!("{}: {}", strategy.label, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwapsConfig;
    use crate::swaps::tests::{quote_json, FakeAggregator, FakeChain, FakeSigner};
    use crate::swaps::types::SOL_MINT;

    struct Harness {
        aggregator: Arc<FakeAggregator>,
        signer: Arc<FakeSigner>,
        chain: Arc<FakeChain>,
        submitter: TransactionSubmitter,
    }

    fn harness(signer: FakeSigner, chain: FakeChain) -> Harness {
        let aggregator = Arc::new(FakeAggregator::new());
        let signer = Arc::new(signer);
        let chain = Arc::new(chain);
        let builder = Arc::new(TransactionBuilder::new(aggregator.clone(), SwapsConfig::default()));
        let submitter =
            TransactionSubmitter::new(builder, signer.clone(), chain.clone(), Duration::from_secs(90));
        Harness {
            aggregator,
            signer,
            chain,
            submitter,
        }
    }

    fn quote() -> Quote {
        Quote::from_response(quote_json(SOL_MINT, "mint", 1_000_000, 5_000, 0.1), 100).unwrap()
    }

    fn payload() -> UnsignedTransactionPayload {
        UnsignedTransactionPayload {
            bytes: b"current-tx".to_vec(),
            format: TransactionFormat::Versioned,
            generation: ApiGeneration::Current,
            last_valid_block_height: None,
        }
    }

    #[tokio::test]
    async fn test_first_rung_success() {
        let h = harness(FakeSigner::new(), FakeChain::new());
        let receipt = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap();

        assert_eq!(receipt.format, TransactionFormat::Versioned);
        assert_eq!(receipt.strategy, "versioned");
        assert_eq!(h.signer.attempts(), vec![TransactionFormat::Versioned]);
        assert_eq!(h.chain.submitted().len(), 1);
        assert!(h.aggregator.build_calls().is_empty());
    }

    #[tokio::test]
    async fn test_falls_through_to_rebuilt_legacy() {
        let h = harness(
            FakeSigner::new().failing_on(b"current-tx", TransactionFormat::Versioned)
                .failing_on(b"current-tx", TransactionFormat::Legacy),
            FakeChain::new(),
        );
        let receipt = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap();

        assert_eq!(receipt.strategy, "legacy-rebuilt");
        assert_eq!(receipt.generation, ApiGeneration::Legacy);
        assert_eq!(
            h.signer.attempts(),
            vec![
                TransactionFormat::Versioned,
                TransactionFormat::Legacy,
                TransactionFormat::Legacy
            ]
        );
        assert_eq!(h.aggregator.build_calls(), vec![ApiGeneration::Legacy]);
    }

    #[tokio::test]
    async fn test_total_failure_aggregates_every_message() {
        let h = harness(
            FakeSigner::new()
                .failing_on(b"current-tx", TransactionFormat::Versioned)
                .failing_on(b"current-tx", TransactionFormat::Legacy),
            FakeChain::new(),
        );
        h.aggregator.push_build(Err(SwapError::Http {
            status: 500,
            endpoint: "https://legacy.example.org/swap".to_string(),
            body: "internal error".to_string(),
        }));

        let err = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap_err();

        match err {
            SwapError::SubmissionFailed { attempts } => {
                assert_eq!(attempts.len(), 3);
                assert!(attempts[0].starts_with("versioned: Signing failed (versioned)"));
                assert!(attempts[1].starts_with("legacy: Signing failed (legacy)"));
                assert!(attempts[2].starts_with("legacy-rebuilt: Build failed"));
                assert!(attempts[2].contains("internal error"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(h.chain.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_on_chain_failure_stops_the_ladder() {
        let h = harness(FakeSigner::new(), FakeChain::new().with_on_chain_failure("custom program error: 0x1"));
        let err = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap_err();

        assert!(matches!(err, SwapError::OnChainFailure { .. }));
        assert_eq!(h.signer.attempts().len(), 1);
        assert_eq!(h.chain.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_timeout_is_not_resubmitted() {
        let h = harness(FakeSigner::new(), FakeChain::new().with_confirmation_timeout());
        let err = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap_err();

        assert!(matches!(err, SwapError::ConfirmationUnknown { .. }));
        assert_eq!(h.chain.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejection_moves_to_next_rung() {
        let h = harness(FakeSigner::new(), FakeChain::new().rejecting_submissions(1));
        let receipt = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap();

        assert_eq!(receipt.strategy, "legacy");
        assert_eq!(h.chain.submitted().len(), 2);
    }

    #[tokio::test]
    async fn test_lost_submission_is_never_resent() {
        let h = harness(
            FakeSigner::new().failing_on(b"current-tx", TransactionFormat::Legacy),
            FakeChain::new().with_lost_submission(),
        );
        let err = h
            .submitter
            .submit(payload(), &quote(), &BuildOptions::current(true))
            .await
            .unwrap_err();

        match err {
            SwapError::ConfirmationUnknown { signature, message } => {
                assert_eq!(signature, "sig-versioned-current-tx");
                assert!(message.contains("timed out"));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(h.chain.submitted().len(), 1);
        assert_eq!(h.signer.attempts(), vec![TransactionFormat::Versioned]);
        assert!(h.aggregator.build_calls().is_empty());
    }
}
