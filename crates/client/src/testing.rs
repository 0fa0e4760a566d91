//! Scripted [`ChainClient`] for tests.
//!
//! Every call is recorded in order, so tests can assert that the approval was
//! mined before the transfer was sent. Submits and receipts follow a queue of
//! scripted outcomes and fall back to success once the queue is empty.

use crate::chain::{CallKind, ChainClient, ContractCall, Receipt};
use alloy_primitives::{Address, TxHash, B256, U256};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard},
};

/// A call made against the scripted client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    ChainId,
    BalanceOf,
    Allowance { spender: Address },
    Name,
    Decimals,
    Submit { kind: CallKind, tx_hash: Option<TxHash> },
    AwaitReceipt { tx_hash: TxHash, confirmations: u64 },
}

/// What the wallet does with the next submit.
#[derive(Debug, Clone)]
pub enum SubmitScript {
    /// User signs, node accepts
    Sign,
    /// Wallet or node returns an error
    Reject(String),
    /// Prompt is never answered
    Hang,
}

/// What the next receipt wait yields.
#[derive(Debug, Clone)]
pub enum ReceiptScript {
    Success,
    Revert,
    Error(String),
    Hang,
}

#[derive(Debug)]
struct Script {
    chain_id: u64,
    name: Result<String, String>,
    decimals: Result<u8, String>,
    balance: Result<U256, String>,
    allowance: Result<U256, String>,
    submits: VecDeque<SubmitScript>,
    receipts: VecDeque<ReceiptScript>,
    calls: Vec<Recorded>,
    submitted: Vec<ContractCall>,
    next_hash: u8,
}

/// Chain client whose answers are set up front.
#[derive(Debug, Clone)]
pub struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new(31337)
    }
}

impl ScriptedClient {
    /// A healthy 18-decimals token with zero balance and zero allowance.
    pub fn new(chain_id: u64) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                chain_id,
                name: Ok("Test Token".to_string()),
                decimals: Ok(18),
                balance: Ok(U256::ZERO),
                allowance: Ok(U256::ZERO),
                submits: VecDeque::new(),
                receipts: VecDeque::new(),
                calls: Vec::new(),
                submitted: Vec::new(),
                next_hash: 0,
            })),
        }
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // a panicking test thread must not hide the calls recorded so far
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.script().name = Ok(name.into());
        self
    }

    pub fn with_decimals(self, decimals: u8) -> Self {
        self.script().decimals = Ok(decimals);
        self
    }

    pub fn with_balance(self, balance: U256) -> Self {
        self.script().balance = Ok(balance);
        self
    }

    pub fn with_allowance(self, allowance: U256) -> Self {
        self.script().allowance = Ok(allowance);
        self
    }

    pub fn failing_name(self, error: impl Into<String>) -> Self {
        self.script().name = Err(error.into());
        self
    }

    pub fn failing_decimals(self, error: impl Into<String>) -> Self {
        self.script().decimals = Err(error.into());
        self
    }

    pub fn failing_balance(self, error: impl Into<String>) -> Self {
        self.script().balance = Err(error.into());
        self
    }

    pub fn failing_allowance(self, error: impl Into<String>) -> Self {
        self.script().allowance = Err(error.into());
        self
    }

    /// Queue the outcome of the next unscripted submit.
    pub fn then_submit(self, outcome: SubmitScript) -> Self {
        self.script().submits.push_back(outcome);
        self
    }

    /// Queue the outcome of the next unscripted receipt wait.
    pub fn then_receipt(self, outcome: ReceiptScript) -> Self {
        self.script().receipts.push_back(outcome);
        self
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<Recorded> {
        self.script().calls.clone()
    }

    /// Calldata of every submit so far, signed or not.
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.script().submitted.clone()
    }

    fn record(&self, call: Recorded) {
        self.script().calls.push(call);
    }
}

impl ChainClient for ScriptedClient {
    async fn chain_id(&self) -> eyre::Result<u64> {
        let mut script = self.script();
        script.calls.push(Recorded::ChainId);
        Ok(script.chain_id)
    }

    async fn read_balance_of(&self, _token: Address, _owner: Address) -> eyre::Result<U256> {
        self.record(Recorded::BalanceOf);
        self.script().balance.clone().map_err(|e| eyre::eyre!(e))
    }

    async fn read_allowance(
        &self,
        _token: Address,
        _owner: Address,
        spender: Address,
    ) -> eyre::Result<U256> {
        self.record(Recorded::Allowance { spender });
        self.script().allowance.clone().map_err(|e| eyre::eyre!(e))
    }

    async fn read_name(&self, _token: Address) -> eyre::Result<String> {
        self.record(Recorded::Name);
        self.script().name.clone().map_err(|e| eyre::eyre!(e))
    }

    async fn read_decimals(&self, _token: Address) -> eyre::Result<u8> {
        self.record(Recorded::Decimals);
        self.script().decimals.clone().map_err(|e| eyre::eyre!(e))
    }

    async fn submit(&self, call: ContractCall) -> eyre::Result<TxHash> {
        let outcome = {
            let mut script = self.script();
            let kind = call.kind();
            let outcome = script.submits.pop_front().unwrap_or(SubmitScript::Sign);
            let tx_hash = match outcome {
                SubmitScript::Sign => {
                    script.next_hash += 1;
                    Some(B256::with_last_byte(script.next_hash))
                }
                _ => None,
            };
            script.calls.push(Recorded::Submit { kind, tx_hash });
            script.submitted.push(call);
            (outcome, tx_hash)
        };

        match outcome {
            (SubmitScript::Sign, Some(tx_hash)) => Ok(tx_hash),
            (SubmitScript::Reject(reason), _) => Err(eyre::eyre!(reason)),
            _ => std::future::pending().await,
        }
    }

    async fn await_receipt(&self, tx_hash: TxHash, confirmations: u64) -> eyre::Result<Receipt> {
        let outcome = {
            let mut script = self.script();
            script.calls.push(Recorded::AwaitReceipt {
                tx_hash,
                confirmations,
            });
            script.receipts.pop_front().unwrap_or(ReceiptScript::Success)
        };

        let success = match outcome {
            ReceiptScript::Success => true,
            ReceiptScript::Revert => false,
            ReceiptScript::Error(reason) => return Err(eyre::eyre!(reason)),
            ReceiptScript::Hang => std::future::pending().await,
        };

        Ok(Receipt {
            tx_hash,
            block_number: Some(1),
            gas_used: Some(21_000),
            success,
        })
    }
}
