//! Token metadata and the facts derived from it.
//!
//! This crate provides:
//! - [`TokenState`]: the externally read name, decimals, balance and allowance
//!   of one token for one owner, each of which can independently be pending,
//!   loaded or failed
//! - [`reader::TokenReader`]: fetches a [`TokenState`] through a chain client
//! - [`readiness::assess`]: combines the form and the token state into a
//!   single "ready to submit" answer
//! - [`details::TransactionDetails`]: the human summary of what will be sent
//!
//! Everything except the reader is a pure function of its inputs and must be
//! recomputed by the caller whenever the form or the token state changes.

pub mod details;
pub mod reader;
pub mod readiness;

pub use details::TransactionDetails;
pub use reader::TokenReader;
pub use readiness::{assess, Blocker, Readiness};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// One externally read value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRead<T> {
    /// Not resolved yet
    #[default]
    Pending,
    Loaded(T),
    /// The read errored
    Failed(String),
}

impl<T> FieldRead<T> {
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl<T> From<eyre::Result<T>> for FieldRead<T> {
    fn from(result: eyre::Result<T>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(e) => Self::Failed(format!("{e:#}")),
        }
    }
}

/// Complete metadata snapshot, available once every read has loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub decimals: u8,
    pub balance: U256,
    pub allowance: U256,
}

/// Metadata of one token as seen by one owner.
///
/// Belongs to the token address it was read for; once the token field
/// changes the state is stale and must be read again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
    /// Token field the reads were made for, trimmed
    pub address: String,
    pub name: FieldRead<String>,
    pub decimals: FieldRead<u8>,
    pub balance: FieldRead<U256>,
    /// Allowance towards the router; not part of token validity
    pub allowance: FieldRead<U256>,
}

impl TokenState {
    /// Nothing read yet for `address`.
    pub fn pending(address: &str) -> Self {
        Self {
            address: address.trim().to_string(),
            ..Self::default()
        }
    }

    /// True if this state was read for a different token field.
    pub fn is_stale_for(&self, token_field: &str) -> bool {
        self.address != token_field.trim()
    }

    /// Parsed token address, if the field holds one.
    pub fn token(&self) -> Option<Address> {
        self.address.parse().ok()
    }

    /// Address non-empty, none of the three reads errored, decimals known,
    /// and name known and non-empty.
    ///
    /// A balance that is merely pending does not invalidate the token.
    pub fn is_valid_token(&self) -> bool {
        validate_token(
            &self.address,
            self.name.loaded().map(String::as_str),
            self.decimals.loaded().copied(),
        ) && !self.name.is_failed()
            && !self.decimals.is_failed()
            && !self.balance.is_failed()
    }

    /// Whether the balance covers `total`. See [`has_enough_tokens`].
    pub fn has_enough_tokens(&self, total: U256) -> bool {
        has_enough_tokens(self.is_valid_token(), self.balance.loaded().copied(), total)
    }

    /// True while any of the reads that decide validity is unresolved.
    pub const fn is_loading(&self) -> bool {
        self.name.is_pending() || self.decimals.is_pending()
    }

    pub fn metadata(&self) -> Option<TokenMetadata> {
        Some(TokenMetadata {
            name: self.name.loaded()?.clone(),
            decimals: *self.decimals.loaded()?,
            balance: *self.balance.loaded()?,
            allowance: *self.allowance.loaded()?,
        })
    }
}

/// Token is usable: address present, decimals known, name known and non-empty.
pub fn validate_token(address: &str, name: Option<&str>, decimals: Option<u8>) -> bool {
    if address.trim().is_empty() {
        return false;
    }

    decimals.is_some() && name.is_some_and(|name| !name.is_empty())
}

/// Whether `balance` covers `total`.
///
/// Never blocks when no check applies: an invalid token, a zero total, or a
/// balance that is still loading all return true. The caller surfaces those
/// conditions separately.
pub fn has_enough_tokens(is_valid: bool, balance: Option<U256>, total: U256) -> bool {
    if !is_valid || total.is_zero() {
        return true;
    }

    balance.is_none_or(|balance| balance >= total)
}
