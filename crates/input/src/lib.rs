//! Parsing and validation of the airdrop form.
//!
//! The form has three free-text fields: the token address, the recipients and
//! the amounts. Parsing is total and never fails; validation is a set of pure
//! predicates the caller uses to decide whether submission is allowed.
//!
//! Malformed tokens are elided from the parsed lists rather than zero-filled.
//! Eliding alone could pair recipient `i` with the wrong amount, so
//! [`ParsedForm::is_aligned`] additionally requires that nothing was elided.

pub mod amount;
pub mod recipient;

pub use amount::{calculate_total, parse_amounts, ParsedAmounts, RejectReason, RejectedToken};
pub use recipient::{parse_recipients, RecipientList};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// The raw form fields as entered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Form {
    /// Token contract address
    pub token: String,
    /// Recipients, comma or newline separated
    pub recipients: String,
    /// Amounts in base units, comma, space or newline separated
    pub amounts: String,
}

impl Form {
    pub fn new(
        token: impl Into<String>,
        recipients: impl Into<String>,
        amounts: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            recipients: recipients.into(),
            amounts: amounts.into(),
        }
    }

    /// True when any of the three fields is blank.
    pub fn is_incomplete(&self) -> bool {
        [&self.token, &self.recipients, &self.amounts]
            .iter()
            .any(|field| field.trim().is_empty())
    }

    /// The token address, if the field holds one.
    pub fn token_address(&self) -> Option<Address> {
        self.token.trim().parse().ok()
    }

    pub fn parse(&self) -> ParsedForm {
        ParsedForm {
            recipients: parse_recipients(&self.recipients),
            amounts: parse_amounts(&self.amounts),
        }
    }
}

/// Recipients and amounts after parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedForm {
    pub recipients: RecipientList,
    pub amounts: ParsedAmounts,
}

impl ParsedForm {
    /// Exact sum of the accepted amounts.
    pub const fn total(&self) -> U256 {
        self.amounts.total
    }

    /// See [`counts_match`].
    pub fn counts_match(&self) -> bool {
        counts_match(&self.recipients, &self.amounts)
    }

    /// Counts match and no token was dropped from either list.
    pub fn is_aligned(&self) -> bool {
        self.counts_match() && self.amounts.is_clean() && self.recipients.malformed().is_empty()
    }

    /// The arguments of the batched transfer, only when the lists are aligned.
    pub fn transfer_lists(&self) -> Option<(Vec<Address>, Vec<U256>)> {
        self.is_aligned()
            .then(|| (self.recipients.addresses(), self.amounts.amounts.clone()))
    }
}

/// True iff there are as many recipients as accepted amounts, and at least one of each.
pub fn counts_match(recipients: &RecipientList, amounts: &ParsedAmounts) -> bool {
    !recipients.is_empty() && recipients.len() == amounts.len()
}

/// Parse both fields and check their counts.
pub fn validate(recipients: &str, amounts: &str) -> bool {
    counts_match(&parse_recipients(recipients), &parse_amounts(amounts))
}
