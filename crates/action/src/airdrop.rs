//! Airdrop action.
//!
//! Sends the whole batch in one `airdropERC20` call. The router pulls `total`
//! from the owner, so the allowance must already cover it.

use crate::{send_and_confirm, Action};
use alloy_primitives::{Address, U256};
use client::{ChainClient, ContractCall};
use lifecycle::Tracker;
use tracing::info;

/// Input data for a batched transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Airdrop {
    /// Router contract
    pub router: Address,
    /// ERC-20 token contract
    pub token: Address,
    /// Recipient `i` receives `amounts[i]`
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
    /// Sum of `amounts`
    pub total: U256,
}

impl Airdrop {
    /// Lists are non-empty, of equal length, and `total` is their exact sum.
    pub fn is_consistent(&self) -> bool {
        if self.recipients.is_empty() || self.recipients.len() != self.amounts.len() {
            return false;
        }

        let sum = self
            .amounts
            .iter()
            .try_fold(U256::ZERO, |sum, amount| sum.checked_add(*amount));
        sum == Some(self.total)
    }
}

/// Action to send the batched transfer.
pub struct AirdropAction<C> {
    client: C,
    tracker: Tracker,
    confirmations: u64,
    action: Airdrop,
}

impl<C> AirdropAction<C>
where
    C: ChainClient,
{
    pub const fn new(client: C, tracker: Tracker, confirmations: u64, action: Airdrop) -> Self {
        Self {
            client,
            tracker,
            confirmations,
            action,
        }
    }
}

impl<C> Action for AirdropAction<C>
where
    C: ChainClient,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(self.action.router != Address::ZERO && self.action.is_consistent())
    }

    async fn is_completed(&self) -> eyre::Result<bool> {
        // a batch can legitimately be sent twice
        Ok(false)
    }

    async fn execute(&mut self) -> eyre::Result<crate::Result> {
        if !self.is_ready().await? {
            eyre::bail!("Airdrop not ready: recipients, amounts and total disagree");
        }

        info!(
            router = %self.action.router,
            token = %self.action.token,
            recipients = self.action.recipients.len(),
            total = %self.action.total,
            "Sending airdrop"
        );

        let call = ContractCall::airdrop(
            self.action.router,
            self.action.token,
            self.action.recipients.clone(),
            self.action.amounts.clone(),
            self.action.total,
        );
        send_and_confirm(&self.client, &self.tracker, call, self.confirmations, "airdrop").await
    }

    fn description(&self) -> String {
        format!(
            "Airdrop {} of token {} to {} recipients",
            self.action.total,
            self.action.token,
            self.action.recipients.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolCall;
    use binding::router::ITSender;
    use client::testing::ScriptedClient;
    use lifecycle::TransactionLifecycle;

    fn airdrop() -> Airdrop {
        Airdrop {
            router: Address::repeat_byte(0x22),
            token: Address::repeat_byte(0x11),
            recipients: vec![Address::repeat_byte(0x01), Address::repeat_byte(0x02)],
            amounts: vec![U256::from(40), U256::from(60)],
            total: U256::from(100),
        }
    }

    #[test]
    fn test_is_consistent() {
        assert!(airdrop().is_consistent());

        let mut wrong_total = airdrop();
        wrong_total.total = U256::from(99);
        assert!(!wrong_total.is_consistent());

        let mut short = airdrop();
        short.amounts.pop();
        assert!(!short.is_consistent());

        let empty = Airdrop {
            recipients: vec![],
            amounts: vec![],
            total: U256::ZERO,
            ..airdrop()
        };
        assert!(!empty.is_consistent());
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_encodes_batch() {
        let client = ScriptedClient::default();
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();
        let mut action = AirdropAction::new(client.clone(), tracker, 1, airdrop());

        assert!(action.is_ready().await.unwrap());
        assert!(!action.is_completed().await.unwrap());
        action.execute().await.unwrap();

        let sent = client.submitted();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Address::repeat_byte(0x22));
        let decoded = ITSender::airdropERC20Call::abi_decode(&sent[0].input).unwrap();
        assert_eq!(decoded.tokenAddress, Address::repeat_byte(0x11));
        assert_eq!(decoded.recipients, airdrop().recipients);
        assert_eq!(decoded.amounts, airdrop().amounts);
        assert_eq!(decoded.totalAmount, U256::from(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inconsistent_batch_is_not_sent() {
        let client = ScriptedClient::default();
        let lifecycle = TransactionLifecycle::default();
        let tracker = lifecycle.submit().unwrap();
        let mut action = AirdropAction::new(
            client.clone(),
            tracker,
            1,
            Airdrop {
                total: U256::from(1),
                ..airdrop()
            },
        );

        assert!(action.execute().await.is_err());
        assert!(client.submitted().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_description() {
        let lifecycle = TransactionLifecycle::default();
        let action = AirdropAction::new(
            ScriptedClient::default(),
            lifecycle.submit().unwrap(),
            1,
            airdrop(),
        );
        assert!(action.description().contains("to 2 recipients"));
    }
}
