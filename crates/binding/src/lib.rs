//! Contract bindings for all external contracts.
//!
//! This crate consolidates the Solidity interfaces the airdrop tool talks to:
//! - ERC20 tokens (metadata, balance, allowance, approve)
//! - The batched-transfer router (`airdropERC20`)
//!
//! All bindings are generated using alloy's `sol!` macro.

pub mod router;
pub mod token;
