//! Approve action.
//!
//! Raises the router's allowance so that the batched transfer can pull the
//! total from the owner.

use crate::{send_and_confirm, Action};
use alloy_primitives::{Address, U256};
use client::{ChainClient, ContractCall};
use lifecycle::Tracker;
use tracing::{debug, info};

/// Input data for an approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approve {
    /// ERC-20 token contract
    pub token: Address,
    /// Account whose tokens are spent
    pub owner: Address,
    /// Router allowed to spend them
    pub spender: Address,
    /// Allowance to set, in base units
    pub amount: U256,
}

/// Action to approve the router for the airdrop total.
pub struct ApproveAction<C> {
    client: C,
    tracker: Tracker,
    confirmations: u64,
    action: Approve,
}

impl<C> ApproveAction<C>
where
    C: ChainClient,
{
    pub const fn new(client: C, tracker: Tracker, confirmations: u64, action: Approve) -> Self {
        Self {
            client,
            tracker,
            confirmations,
            action,
        }
    }

    /// Current allowance of the spender.
    pub async fn allowance(&self) -> eyre::Result<U256> {
        self.client
            .read_allowance(self.action.token, self.action.owner, self.action.spender)
            .await
    }
}

impl<C> Action for ApproveAction<C>
where
    C: ChainClient,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(self.action.spender != Address::ZERO && !self.action.amount.is_zero())
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        let allowance = self.allowance().await?;
        debug!(
            token = %self.action.token,
            spender = %self.action.spender,
            %allowance,
            required = %self.action.amount,
            "Checked allowance"
        );

        Ok(allowance >= self.action.amount)
    }

    /// Sends the approval without re-reading the allowance; check
    /// [`Action::is_completed`] first.
    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if !self.is_ready().await? {
            eyre::bail!("Approval not ready: zero spender or amount");
        }

        info!(
            token = %self.action.token,
            spender = %self.action.spender,
            amount = %self.action.amount,
            "Approving router"
        );

        let call =
            ContractCall::approve(self.action.token, self.action.spender, self.action.amount);
        send_and_confirm(&self.client, &self.tracker, call, self.confirmations, "approve").await
    }

    fn description(&self) -> String {
        format!(
            "Approve {} to spend {} of token {}",
            self.action.spender, self.action.amount, self.action.token
        )
    }
}
