use alloy_primitives::{utils::format_units, U256};
use serde::Serialize;
use std::fmt;

/// Summary of what a submission will send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDetails {
    pub name: Option<String>,
    pub decimals: Option<u8>,
    /// Total in base units
    pub total: U256,
}

impl TransactionDetails {
    pub const fn new(name: Option<String>, decimals: Option<u8>, total: U256) -> Self {
        Self {
            name,
            decimals,
            total,
        }
    }

    /// Total in whole tokens, exact, without trailing zeros.
    ///
    /// `None` while decimals are unknown.
    pub fn token_amount(&self) -> Option<String> {
        let decimals = self.decimals?;
        let formatted = format_units(self.total, decimals).ok()?;

        if !formatted.contains('.') {
            return Some(formatted);
        }
        Some(
            formatted
                .trim_end_matches('0')
                .trim_end_matches('.')
                .to_string(),
        )
    }
}

impl fmt::Display for TransactionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // name and wei are only meaningful once decimals resolved
        let known = self.decimals.is_some();
        let name = self.name.as_deref().filter(|_| known).unwrap_or("-");
        let wei = if known {
            self.total.to_string()
        } else {
            "-".to_string()
        };
        let tokens = self.token_amount().unwrap_or_else(|| "-".to_string());

        writeln!(f, "Token Name:       {name}")?;
        writeln!(f, "Amount in wei:    {wei}")?;
        write!(f, "Amount in tokens: {tokens}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_amount_is_exact() {
        let details = TransactionDetails::new(
            Some("Mock".into()),
            Some(18),
            U256::from(1_500_000_000_000_000_000u128),
        );
        assert_eq!(details.token_amount().as_deref(), Some("1.5"));

        let details = TransactionDetails::new(None, Some(18), U256::from(123_456_789u64));
        assert_eq!(details.token_amount().as_deref(), Some("0.000000000123456789"));
    }

    #[test]
    fn test_zero_and_zero_decimals() {
        let details = TransactionDetails::new(None, Some(18), U256::ZERO);
        assert_eq!(details.token_amount().as_deref(), Some("0"));

        let details = TransactionDetails::new(None, Some(0), U256::from(42));
        assert_eq!(details.token_amount().as_deref(), Some("42"));
    }

    #[test]
    fn test_display_without_decimals() {
        let details = TransactionDetails::new(Some("Mock".into()), None, U256::from(5));
        let text = details.to_string();
        assert!(text.contains("Token Name:       -"));
        assert!(text.contains("Amount in wei:    -"));
        assert!(text.ends_with("Amount in tokens: -"));
    }

    #[test]
    fn test_display_with_decimals() {
        let details = TransactionDetails::new(Some("Mock".into()), Some(2), U256::from(12345));
        let text = details.to_string();
        assert!(text.contains("Token Name:       Mock"));
        assert!(text.contains("Amount in wei:    12345"));
        assert!(text.ends_with("Amount in tokens: 123.45"));
    }
}
