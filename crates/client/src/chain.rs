//! The chain-client capability consumed by the submission engine.
//!
//! Everything that touches the network goes through [`ChainClient`]: the
//! token reads, the allowance read, the wallet-prompting submit and the
//! receipt wait. The engine is generic over it, so tests can script the
//! chain without a node.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::SolCall;
use binding::{router::ITSender, token::IERC20};
use std::future::Future;

/// Which contract function a call invokes, decoded from its selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Approve,
    Airdrop,
    Other,
}

/// A state-changing contract call ready to be signed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Contract being called
    pub to: Address,
    /// ABI-encoded calldata
    pub input: Bytes,
}

impl ContractCall {
    /// `token.approve(spender, amount)`
    pub fn approve(token: Address, spender: Address, amount: U256) -> Self {
        let call = IERC20::approveCall { spender, amount };
        Self {
            to: token,
            input: call.abi_encode().into(),
        }
    }

    /// `router.airdropERC20(token, recipients, amounts, total)`
    pub fn airdrop(
        router: Address,
        token: Address,
        recipients: Vec<Address>,
        amounts: Vec<U256>,
        total: U256,
    ) -> Self {
        let call = ITSender::airdropERC20Call {
            tokenAddress: token,
            recipients,
            amounts,
            totalAmount: total,
        };
        Self {
            to: router,
            input: call.abi_encode().into(),
        }
    }

    pub fn kind(&self) -> CallKind {
        match self.input.get(..4) {
            Some(selector) if selector == IERC20::approveCall::SELECTOR => CallKind::Approve,
            Some(selector) if selector == ITSender::airdropERC20Call::SELECTOR => {
                CallKind::Airdrop
            }
            _ => CallKind::Other,
        }
    }
}

/// Outcome of waiting for a transaction to be mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<u64>,
    /// False when the transaction reverted
    pub success: bool,
}

/// Reads and writes against one chain on behalf of one account.
pub trait ChainClient: Send + Sync {
    /// Chain id of the connected network.
    fn chain_id(&self) -> impl Future<Output = eyre::Result<u64>> + Send;

    /// `token.balanceOf(owner)`
    fn read_balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// `token.allowance(owner, spender)`
    fn read_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = eyre::Result<U256>> + Send;

    /// `token.name()`
    fn read_name(&self, token: Address) -> impl Future<Output = eyre::Result<String>> + Send;

    /// `token.decimals()`
    fn read_decimals(&self, token: Address) -> impl Future<Output = eyre::Result<u8>> + Send;

    /// Ask the wallet to sign and broadcast a call.
    ///
    /// Resolves once the wallet has signed and the transaction was accepted by
    /// the node. May never resolve if the user ignores the prompt.
    fn submit(&self, call: ContractCall) -> impl Future<Output = eyre::Result<TxHash>> + Send;

    /// Wait until a transaction has `confirmations` confirmations.
    fn await_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> impl Future<Output = eyre::Result<Receipt>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_kind_from_selector() {
        let token = Address::repeat_byte(1);
        let router = Address::repeat_byte(2);

        let approve = ContractCall::approve(token, router, U256::from(100));
        assert_eq!(approve.kind(), CallKind::Approve);
        assert_eq!(approve.to, token);

        let airdrop = ContractCall::airdrop(
            router,
            token,
            vec![Address::repeat_byte(3)],
            vec![U256::from(100)],
            U256::from(100),
        );
        assert_eq!(airdrop.kind(), CallKind::Airdrop);
        assert_eq!(airdrop.to, router);

        let other = ContractCall {
            to: token,
            input: Bytes::from_static(&[1, 2]),
        };
        assert_eq!(other.kind(), CallKind::Other);
    }

    #[test]
    fn test_airdrop_calldata_round_trip() {
        let recipients = vec![Address::repeat_byte(3), Address::repeat_byte(4)];
        let amounts = vec![U256::from(1), U256::from(2)];
        let call = ContractCall::airdrop(
            Address::repeat_byte(2),
            Address::repeat_byte(1),
            recipients.clone(),
            amounts.clone(),
            U256::from(3),
        );

        let decoded = ITSender::airdropERC20Call::abi_decode(&call.input).unwrap();
        assert_eq!(decoded.tokenAddress, Address::repeat_byte(1));
        assert_eq!(decoded.recipients, recipients);
        assert_eq!(decoded.amounts, amounts);
        assert_eq!(decoded.totalAmount, U256::from(3));
    }
}
