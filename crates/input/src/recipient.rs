//! Recipient field parsing.
//!
//! Recipients are separated by commas and newlines only. Spaces are not a
//! delimiter, so `0xabc 0xdef` stays one (malformed) token instead of
//! silently turning into two addresses.

use alloy_primitives::Address;

/// Ordered, trimmed, non-empty recipient tokens. Recipient `i` receives amount `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientList {
    entries: Vec<String>,
}

impl RecipientList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The raw tokens in order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Tokens that parse as addresses, in order. Malformed tokens are skipped.
    pub fn addresses(&self) -> Vec<Address> {
        self.entries
            .iter()
            .filter_map(|entry| entry.parse().ok())
            .collect()
    }

    /// Tokens that do not parse as addresses, with their position.
    pub fn malformed(&self) -> Vec<(usize, &str)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.parse::<Address>().is_err())
            .map(|(index, entry)| (index, entry.as_str()))
            .collect()
    }
}

/// Split the recipients field on commas and newlines, trim, and drop empty tokens.
pub fn parse_recipients(text: &str) -> RecipientList {
    let entries = text
        .split([',', '\n'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect();

    RecipientList { entries }
}
