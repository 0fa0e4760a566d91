//! Exact parsing of the amounts field into token base units.
//!
//! Amounts are whole base units (wei-like). Two token forms are accepted:
//! - plain decimals, `-?D+(.D+)?`, truncated toward zero
//! - scientific notation, `-?D+(.D+)?eD+`, with an exponent in `1..=18`
//!
//! Everything is computed in `U256`, so magnitudes far beyond the range of
//! floating point integers stay exact. Parsing never fails: tokens that match
//! neither form, are negative, or do not fit are reported in
//! [`ParsedAmounts::rejected`] and contribute nothing.

use alloy_primitives::U256;
use std::fmt;

/// Smallest accepted scientific exponent.
pub const MIN_EXPONENT: u32 = 1;

/// Largest accepted scientific exponent.
pub const MAX_EXPONENT: u32 = 18;

/// Why a token was dropped from the amount list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Neither a plain decimal nor scientific notation
    Malformed,
    /// Truncated value is below zero
    Negative,
    /// Scientific exponent outside `MIN_EXPONENT..=MAX_EXPONENT`
    ExponentOutOfRange,
    /// Value (or the running total) does not fit into 256 bits
    Overflow,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "not a number"),
            Self::Negative => write!(f, "negative amount"),
            Self::ExponentOutOfRange => {
                write!(f, "exponent outside e{MIN_EXPONENT}..e{MAX_EXPONENT}")
            }
            Self::Overflow => write!(f, "amount too large"),
        }
    }
}

/// A token that did not make it into the amount list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedToken {
    /// Position among the non-empty tokens of the field
    pub index: usize,
    /// The token as typed, trimmed
    pub text: String,
    /// Why it was dropped
    pub reason: RejectReason,
}

/// Result of parsing the amounts field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAmounts {
    /// Accepted amounts in the order they were typed
    pub amounts: Vec<U256>,
    /// Exact sum of `amounts`
    pub total: U256,
    /// Tokens that were dropped, in the order they were typed
    pub rejected: Vec<RejectedToken>,
}

impl ParsedAmounts {
    /// Number of accepted amounts.
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// True when every non-empty token was accepted.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Split the amounts field on any run of commas and whitespace.
pub fn split_amounts(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Parse the amounts field.
///
/// Each token is truncated on its own before it is added to the total, so
/// `total` always equals the sum of `amounts`. `"10.5 20.3 30.7"` gives
/// `[10, 20, 30]` and a total of `60`.
pub fn parse_amounts(text: &str) -> ParsedAmounts {
    let mut parsed = ParsedAmounts::default();

    for (index, token) in split_amounts(text).enumerate() {
        let accepted = parse_amount(token).and_then(|amount| {
            parsed
                .total
                .checked_add(amount)
                .map(|total| (amount, total))
                .ok_or(RejectReason::Overflow)
        });

        match accepted {
            Ok((amount, total)) => {
                parsed.amounts.push(amount);
                parsed.total = total;
            }
            Err(reason) => parsed.rejected.push(RejectedToken {
                index,
                text: token.to_string(),
                reason,
            }),
        }
    }

    parsed
}

/// Sum of the amounts field, ignoring anything that does not parse.
pub fn calculate_total(text: &str) -> U256 {
    parse_amounts(text).total
}

/// Parse a single trimmed token into base units.
pub fn parse_amount(token: &str) -> Result<U256, RejectReason> {
    let (negative, unsigned) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let value = match unsigned.split_once('e') {
        Some((mantissa, exponent)) => parse_scientific(mantissa, exponent)?,
        None => {
            let decimal = Decimal::parse(unsigned)?;
            decimal.scaled(0)?
        }
    };

    // `-0.5` truncates to zero, which is not below zero.
    if negative && !value.is_zero() {
        return Err(RejectReason::Negative);
    }

    Ok(value)
}

fn parse_scientific(mantissa: &str, exponent: &str) -> Result<U256, RejectReason> {
    let mantissa = Decimal::parse(mantissa)?;

    if !is_digits(exponent) {
        return Err(RejectReason::Malformed);
    }
    let exponent: u32 = exponent
        .parse()
        .map_err(|_| RejectReason::ExponentOutOfRange)?;
    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return Err(RejectReason::ExponentOutOfRange);
    }

    mantissa.scaled(exponent)
}

/// Unsigned decimal split into its digit runs.
struct Decimal<'a> {
    integer: &'a str,
    fraction: &'a str,
}

impl<'a> Decimal<'a> {
    fn parse(text: &'a str) -> Result<Self, RejectReason> {
        let (integer, fraction) = text.split_once('.').unwrap_or((text, ""));

        let fraction_ok = !text.contains('.') || is_digits(fraction);
        if !is_digits(integer) || !fraction_ok {
            return Err(RejectReason::Malformed);
        }

        Ok(Self { integer, fraction })
    }

    /// `self × 10^exponent`, truncated toward zero.
    ///
    /// The fraction digits are absorbed by the exponent: `1.5e18` becomes
    /// `15 × 10^17`. Fraction digits beyond the exponent are cut off.
    fn scaled(&self, exponent: u32) -> Result<U256, RejectReason> {
        let places = self.fraction.len().min(exponent as usize);
        let kept = &self.fraction[..places];
        let shift = exponent - places as u32;

        let digits = format!("{}{}", self.integer, kept);
        let value = U256::from_str_radix(&digits, 10).map_err(|_| RejectReason::Overflow)?;

        U256::from(10u8)
            .checked_pow(U256::from(shift))
            .and_then(|scale| value.checked_mul(scale))
            .ok_or(RejectReason::Overflow)
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(text: &str) -> U256 {
        calculate_total(text)
    }

    fn u(value: u128) -> U256 {
        U256::from(value)
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(total(""), U256::ZERO);
        assert_eq!(total("   "), U256::ZERO);
        assert_eq!(total(",\n ,"), U256::ZERO);
        assert!(parse_amounts("").is_empty());
    }

    #[test]
    fn test_single_numbers() {
        assert_eq!(total("100"), u(100));
        assert_eq!(total("  100  "), u(100));
        assert_eq!(total("0"), U256::ZERO);
        assert_eq!(total("123.45"), u(123));
    }

    #[test]
    fn test_mixed_delimiters() {
        assert_eq!(total("100, 200\n300"), u(600));
        assert_eq!(total("100\n200, 300, 400\n500"), u(1500));
        assert_eq!(total("  100 , 200  \n  300 , 400  \n  500  "), u(1500));
        assert_eq!(total("100 200, 300\n400"), u(1000));
        assert_eq!(total("100,200 300"), u(600));
        assert_eq!(total("100\t200\r\n300"), u(600));
    }

    #[test]
    fn test_consecutive_separators_collapse() {
        assert_eq!(total("100,,200"), u(300));
        assert_eq!(total("100,,,200"), u(300));
        assert_eq!(total("100\n\n200"), u(300));
        assert_eq!(total("100,\n,200"), u(300));
        assert_eq!(total("100   200"), u(300));
        assert_eq!(total("100, ,\n 200"), u(300));
    }

    #[test]
    fn test_truncates_each_token_before_summing() {
        let parsed = parse_amounts("10.5 20.3 30.7");
        assert_eq!(parsed.amounts, vec![u(10), u(20), u(30)]);
        assert_eq!(parsed.total, u(60));
        assert!(parsed.is_clean());

        assert_eq!(total("0.1, 0.2"), U256::ZERO);
    }

    #[test]
    fn test_scientific_notation_in_range() {
        assert_eq!(total("1e6"), u(1_000_000));
        assert_eq!(total("100e6"), u(100_000_000));
        assert_eq!(total("1.5e3"), u(1500));
        assert_eq!(total("1e1"), u(10));
        assert_eq!(total("1e18"), u(1_000_000_000_000_000_000));
        assert_eq!(total("1.5e18"), u(1_500_000_000_000_000_000));
    }

    #[test]
    fn test_scientific_notation_out_of_range() {
        let parsed = parse_amounts("1e0");
        assert_eq!(parsed.total, U256::ZERO);
        assert_eq!(parsed.rejected[0].reason, RejectReason::ExponentOutOfRange);

        assert_eq!(total("1e19"), U256::ZERO);
        assert_eq!(total("1e19 100"), u(100));
        assert_eq!(total("1e99999999999999999999"), U256::ZERO);
    }

    #[test]
    fn test_scientific_excess_precision_truncated() {
        // 1.2345e2 = 123.45 -> 123
        assert_eq!(parse_amount("1.2345e2"), Ok(u(123)));
        assert_eq!(parse_amount("0.000001e3"), Ok(U256::ZERO));
    }

    #[test]
    fn test_scientific_grammar_is_strict() {
        assert_eq!(parse_amount("1E6"), Err(RejectReason::Malformed));
        assert_eq!(parse_amount("1e+6"), Err(RejectReason::Malformed));
        assert_eq!(parse_amount("1e-6"), Err(RejectReason::Malformed));
        assert_eq!(parse_amount("e6"), Err(RejectReason::Malformed));
        assert_eq!(parse_amount("1e"), Err(RejectReason::Malformed));
        assert_eq!(parse_amount("1.e6"), Err(RejectReason::Malformed));
    }

    #[test]
    fn test_mixed_with_scientific() {
        assert_eq!(total("100 1e3"), u(1100));
        assert_eq!(total("1e6, 200, 300"), u(1_000_500));
        assert_eq!(total("100\n1e3\n200"), u(1300));
        assert_eq!(total("1.5e2 200 1e3"), u(1350));
    }

    #[test]
    fn test_negative_tokens_dropped() {
        assert_eq!(total("-50"), U256::ZERO);
        assert_eq!(total("-10,20,-30"), u(20));
        assert_eq!(total("-2e3"), U256::ZERO);
        assert_eq!(parse_amount("-1"), Err(RejectReason::Negative));
        // truncation happens before the sign check
        assert_eq!(parse_amount("-0.5"), Ok(U256::ZERO));
        assert_eq!(parse_amount("-0"), Ok(U256::ZERO));
    }

    #[test]
    fn test_invalid_tokens_skipped() {
        assert_eq!(total("100, abc, 200"), u(300));
        assert_eq!(total("100\nabc\n200"), u(300));
        assert_eq!(total("abc"), U256::ZERO);
        assert_eq!(total("100, NaN, 200"), u(300));
        assert_eq!(total("100 xyz 200"), u(300));
        assert_eq!(total("Infinity 1"), u(1));
        assert_eq!(total("100abc .5 5. +5"), U256::ZERO);
    }

    #[test]
    fn test_rejected_tokens_are_reported() {
        let parsed = parse_amounts("100, abc, -5, 1e19, 200");
        assert_eq!(parsed.amounts, vec![u(100), u(200)]);
        assert_eq!(parsed.total, u(300));

        let rejected: Vec<_> = parsed
            .rejected
            .iter()
            .map(|r| (r.index, r.text.as_str(), r.reason))
            .collect();
        assert_eq!(
            rejected,
            vec![
                (1, "abc", RejectReason::Malformed),
                (2, "-5", RejectReason::Negative),
                (3, "1e19", RejectReason::ExponentOutOfRange),
            ]
        );
    }

    #[test]
    fn test_beyond_float_precision() {
        // 2^53 + 1 is not representable as an f64
        assert_eq!(
            total("9007199254740993, 9007199254740993"),
            u(18_014_398_509_481_986)
        );
        assert_eq!(
            total("340282366920938463463374607431768211456 1"),
            U256::from(u128::MAX) + U256::from(2)
        );
    }

    #[test]
    fn test_overflow_is_rejected_not_wrapped() {
        let max = U256::MAX.to_string();
        let parsed = parse_amounts(&format!("{max} 1 2"));
        assert_eq!(parsed.amounts, vec![U256::MAX]);
        assert_eq!(parsed.total, U256::MAX);
        assert_eq!(parsed.rejected.len(), 2);
        assert!(parsed
            .rejected
            .iter()
            .all(|r| r.reason == RejectReason::Overflow));

        let huge = "9".repeat(100);
        assert_eq!(parse_amount(&huge), Err(RejectReason::Overflow));
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = "1.5e18, 7\n abc 3.9";
        assert_eq!(parse_amounts(text), parse_amounts(text));
    }

    #[test]
    fn test_total_equals_sum_of_amounts() {
        let parsed = parse_amounts("1.9 2e1 3.25e1 zz 0 -0.7");
        let sum = parsed
            .amounts
            .iter()
            .fold(U256::ZERO, |acc, amount| acc + *amount);
        assert_eq!(parsed.total, sum);
        assert_eq!(parsed.amounts, vec![u(1), u(20), u(32), U256::ZERO, U256::ZERO]);
    }
}
