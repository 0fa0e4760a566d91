//! Batched-transfer router bindings.
//!
//! The router pulls `totalAmount` from the caller with a single
//! `transferFrom` and fans it out to every recipient, so the caller must have
//! approved the router for at least `totalAmount` beforehand.

use alloy_sol_types::sol;

sol! {
    /// TSender - gas-optimised ERC20 airdrop router
    #[sol(rpc)]
    interface ITSender {
        /// Transfer `amounts[i]` of `tokenAddress` to `recipients[i]`.
        ///
        /// Reverts unless both arrays have the same length and
        /// `totalAmount` equals the sum of `amounts`.
        function airdropERC20(
            address tokenAddress,
            address[] calldata recipients,
            uint256[] calldata amounts,
            uint256 totalAmount
        ) external;
    }
}
