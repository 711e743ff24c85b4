//! Money helpers
//!
//! All amounts are `rust_decimal::Decimal` quantized to two fraction digits.
//! The store keeps integer cents; JSON carries numbers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Quantize an amount to exactly two fraction digits (half-to-even)
pub fn normalize(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

/// Convert a normalized amount to integer cents for storage
pub fn to_cents(amount: Decimal) -> Result<i64> {
    normalize(amount)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| Error::InvalidData(format!("Amount out of range: {}", amount)))
}

/// Build an amount from stored cents
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Display form used in prompts, insights and fallback prose: `$1234.50`
pub fn format_usd(amount: Decimal) -> String {
    format!("${}", normalize(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_pads_and_rounds() {
        assert_eq!(normalize(dec("1000")).to_string(), "1000.00");
        assert_eq!(normalize(dec("120.5")).to_string(), "120.50");
        assert_eq!(normalize(dec("0.125")).to_string(), "0.12");
        assert_eq!(normalize(dec("0.135")).to_string(), "0.14");
    }

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(dec("15.25")).unwrap(), 1525);
        assert_eq!(from_cents(1525), dec("15.25"));
        assert_eq!(from_cents(500000).to_string(), "5000.00");
    }

    #[test]
    fn test_cents_out_of_range() {
        assert!(matches!(to_cents(Decimal::from_scientific("1e28").unwrap()), Err(Error::InvalidData(_))));
        assert!(matches!(to_cents(Decimal::MAX), Err(Error::InvalidData(_))));
        // Fits in Decimal but not in i64 cents
        assert!(matches!(to_cents(dec("1000000000000000000")), Err(Error::InvalidData(_))));
        assert_eq!(to_cents(dec("92233720368547758.07")).unwrap(), i64::MAX);
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec("800")), "$800.00");
        assert_eq!(format_usd(dec("-45.5")), "$-45.50");
    }
}
