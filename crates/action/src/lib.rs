//! The two-step airdrop submission.
//!
//! [`approve::ApproveAction`] raises the router's allowance when it does not
//! cover the total, [`airdrop::AirdropAction`] sends the batched transfer and
//! [`submit::Submitter`] runs them in that order under a
//! [`lifecycle::TransactionLifecycle`].

pub mod airdrop;
pub mod approve;
pub mod submit;

pub use airdrop::{Airdrop, AirdropAction};
pub use approve::{Approve, ApproveAction};
pub use submit::{SubmitError, SubmitOutcome, Submitter};

use alloy_primitives::{TxHash, U256};
use client::{ChainClient, ContractCall};
use lifecycle::Tracker;
use std::future::Future;
use tracing::info;

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all predictions are met.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if executing it would change nothing.
    fn is_completed(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action.
    ///
    /// Returns once the transaction is confirmed.
    fn execute(&mut self) -> impl Future<Output = eyre::Result<Result>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Result of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Result {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<U256>,
}

/// A mined transaction that reverted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{action} transaction {tx_hash} reverted")]
pub struct Reverted {
    pub action: &'static str,
    pub tx_hash: TxHash,
}

/// Prompt the wallet for `call`, then wait for its receipt.
async fn send_and_confirm<C: ChainClient>(
    client: &C,
    tracker: &Tracker,
    call: ContractCall,
    confirmations: u64,
    action: &'static str,
) -> eyre::Result<Result> {
    tracker.prompt();
    let tx_hash = client
        .submit(call)
        .await
        .map_err(|e| e.wrap_err(format!("Failed to send {action} transaction")))?;
    tracker.signed(tx_hash);

    info!(%tx_hash, action, "Transaction sent, waiting for receipt");

    let receipt = client
        .await_receipt(tx_hash, confirmations)
        .await
        .map_err(|e| e.wrap_err(format!("Failed to get {action} receipt for {tx_hash}")))?;

    if !receipt.success {
        return Err(Reverted { action, tx_hash }.into());
    }

    info!(
        %tx_hash,
        block_number = receipt.block_number,
        gas_used = receipt.gas_used,
        action,
        "Transaction confirmed"
    );

    Ok(Result {
        tx_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used.map(U256::from),
    })
}
