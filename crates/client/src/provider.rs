use crate::chain::{ChainClient, ContractCall, Receipt};
use alloy_network::TransactionBuilder;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{PendingTransactionBuilder, Provider};
use alloy_rpc_types::TransactionRequest;
use binding::token::IERC20;
use eyre::Result;
use tracing::debug;

/// [`ChainClient`] backed by an alloy provider.
///
/// Built on a wallet provider (see [`crate::create_wallet_provider`]) so that
/// `submit` is signed.
#[derive(Debug, Clone)]
pub struct ProviderChainClient<P> {
    provider: P,
}

impl<P> ProviderChainClient<P>
where
    P: Provider + Clone,
{
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P> ChainClient for ProviderChainClient<P>
where
    P: Provider + Clone,
{
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn read_balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        debug!("Querying erc20 {} balance: address={}", token, owner);

        let contract = IERC20::new(token, &self.provider);
        Ok(contract.balanceOf(owner).call().await?)
    }

    async fn read_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        debug!(%token, %owner, %spender, "Querying erc20 allowance");

        let contract = IERC20::new(token, &self.provider);
        Ok(contract.allowance(owner, spender).call().await?)
    }

    async fn read_name(&self, token: Address) -> Result<String> {
        let contract = IERC20::new(token, &self.provider);
        Ok(contract.name().call().await?)
    }

    async fn read_decimals(&self, token: Address) -> Result<u8> {
        let contract = IERC20::new(token, &self.provider);
        Ok(contract.decimals().call().await?)
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHash> {
        debug!(to = %call.to, kind = ?call.kind(), "Sending transaction");

        let tx = TransactionRequest::default()
            .with_to(call.to)
            .with_input(call.input);
        let pending = self.provider.send_transaction(tx).await?;

        Ok(*pending.tx_hash())
    }

    async fn await_receipt(&self, tx_hash: TxHash, confirmations: u64) -> Result<Receipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations)
            .get_receipt()
            .await?;

        Ok(Receipt {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used),
            success: receipt.status(),
        })
    }
}
