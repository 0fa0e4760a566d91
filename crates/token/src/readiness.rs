//! Whether the form may be submitted, and if not, why.

use crate::TokenState;
use input::{Form, ParsedForm};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition that keeps the form from being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blocker {
    /// No token address entered
    EmptyToken,
    /// Token metadata or balance is still being read
    Loading,
    /// Token reads failed or returned no usable metadata
    InvalidToken,
    /// Recipients or amounts field is blank
    Incomplete,
    /// Amounts add up to zero
    ZeroTotal,
    /// Number of recipients differs from number of amounts
    CountMismatch,
    /// Counts match, but some token was dropped so pairs may be shifted
    Misaligned,
    /// Balance is below the total
    InsufficientBalance,
}

impl Blocker {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EmptyToken => "Enter token address",
            Self::Loading => "Loading token data...",
            Self::InvalidToken => "Invalid token address",
            Self::Incomplete => "Complete all fields",
            Self::ZeroTotal => "Total amount is zero",
            Self::CountMismatch => "Recipient and amount counts differ",
            Self::Misaligned => "Some recipients or amounts could not be parsed",
            Self::InsufficientBalance => "Insufficient token balance",
        }
    }
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    Ready,
    Blocked(Blocker),
}

impl Readiness {
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn blocker(&self) -> Option<Blocker> {
        match self {
            Self::Ready => None,
            Self::Blocked(blocker) => Some(*blocker),
        }
    }
}

/// Decide whether `form` can be submitted given the token state read for it.
///
/// Checks run in a fixed order and the first failing one wins, so the caller
/// always shows the most fundamental problem first.
pub fn assess(form: &Form, parsed: &ParsedForm, token: &TokenState) -> Readiness {
    use Blocker::*;

    let blocked = if form.token.trim().is_empty() {
        Some(EmptyToken)
    } else if token.is_stale_for(&form.token) || token.is_loading() {
        Some(Loading)
    } else if !token.is_valid_token() {
        Some(InvalidToken)
    } else if form.recipients.trim().is_empty() || form.amounts.trim().is_empty() {
        Some(Incomplete)
    } else if parsed.total().is_zero() {
        Some(ZeroTotal)
    } else if !parsed.counts_match() {
        Some(CountMismatch)
    } else if !parsed.is_aligned() {
        Some(Misaligned)
    } else if token.balance.is_pending() {
        Some(Loading)
    } else if !token.has_enough_tokens(parsed.total()) {
        Some(InsufficientBalance)
    } else {
        None
    };

    blocked.map_or(Readiness::Ready, Readiness::Blocked)
}
