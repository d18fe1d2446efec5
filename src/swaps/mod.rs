//! Swap execution pipeline
//!
//! Stages, leaves first:
//! - `quote`: price quotes and the sellability check
//! - `builder`: unsigned transactions for a quote, per API generation
//! - `signer` + `submitter`: the versioned -> legacy -> rebuilt-legacy ladder
//! - `coordinator`: amount reduction on liquidity failures
//! - `executor`: validating facade used by the CLI
//!
//! `aggregator` holds the HTTP seam to the swap aggregator and `types` the
//! shared data model.

pub mod aggregator;
pub mod builder;
pub mod coordinator;
pub mod executor;
pub mod quote;
pub mod signer;
pub mod submitter;
pub mod types;


pub use aggregator::{AggregatorClient, JupiterClient, QuoteParams};
pub use builder::{min_output_amount, BuildOptions, TransactionBuilder};
pub use coordinator::{AdaptiveRetryCoordinator, REDUCTION_HINT, REDUCTION_SCHEDULE};
pub use executor::SwapExecutor;
pub use quote::{evaluate_sellability, slippage_bps, QuoteOptions, QuoteProvider};
pub use signer::{KeypairTransactionSigner, TransactionSigner};
pub use submitter::{SubmissionReceipt, SubmitStrategy, TransactionSubmitter, SUBMIT_LADDER};
pub use types::{
    ApiGeneration, ConfirmationStatus, Quote, Sellability, SwapOutcome, SwapRequest, SwapResult,
    TokenInfo, TransactionFormat, UnsignedTransactionPayload, SOL_MINT,
};
