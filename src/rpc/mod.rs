//! Chain RPC collaborator
//!
//! `ChainClient` is the contract the swap pipeline needs from the chain:
//! submit, confirm at "confirmed" commitment, and balance reads.
//! `RpcClient` implements it as JSON-RPC over an ordered endpoint list.

pub mod client;

pub use client::RpcClient;

use crate::errors::SwapError;
use crate::swaps::types::{ConfirmationStatus, SignedTransaction};
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::time::Duration;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Send a signed transaction; returns its signature
    async fn submit_transaction(&self, transaction: &SignedTransaction) -> Result<String, SwapError>;

    /// Wait until the signature reaches "confirmed" commitment
    ///
    /// Fails with `OnChainFailure` when the chain reports the transaction
    /// failed, and with `Timeout` when it is not seen in time.
    async fn confirm_transaction(
        &self,
        signature: &str,
        timeout: Duration,
    ) -> Result<ConfirmationStatus, SwapError>;

    /// Lamports held by `owner`
    async fn get_sol_balance(&self, owner: &Pubkey) -> Result<u64, SwapError>;

    /// Raw token units of `mint` held by `owner` across its token accounts
    async fn get_token_balance(&self, owner: &Pubkey, mint: &str) -> Result<u64, SwapError>;
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}
