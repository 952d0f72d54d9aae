//! Fixed-point price handling.
//!
//! Prices are stored as integer minor units (cents) to keep arithmetic and
//! SQL comparisons exact. The API boundary uses decimal strings
//! (`"125.50"`), parsed and formatted here.

use crate::{Error, Result};

/// Parse a decimal price string into minor units.
///
/// Accepts `"12"`, `"12.5"`, and `"12.50"` forms. Rejects negative values,
/// more than two fractional digits, and anything non-numeric.
pub fn parse_price(input: &str) -> Result<i64> {
    let s = input.trim();
    if s.is_empty() {
        return Err(Error::Validation("price is required".into()));
    }
    if s.starts_with('-') {
        return Err(Error::Validation("price must not be negative".into()));
    }

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Validation(format!("invalid price: {input}")));
    }
    if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Validation(format!("invalid price: {input}")));
    }

    let whole: i64 = whole
        .parse()
        .map_err(|_| Error::Validation(format!("price out of range: {input}")))?;

    let cents = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| {
            Error::Validation(format!("invalid price: {input}"))
        })? * 10,
        _ => frac.parse::<i64>().map_err(|_| {
            Error::Validation(format!("invalid price: {input}"))
        })?,
    };

    whole
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(|| Error::Validation(format!("price out of range: {input}")))
}

/// Format minor units back into a decimal string with two fractional digits.
pub fn format_price(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole() {
        assert_eq!(parse_price("125").unwrap(), 12500);
    }

    #[test]
    fn parse_two_digit_fraction() {
        assert_eq!(parse_price("125.50").unwrap(), 12550);
    }

    #[test]
    fn parse_one_digit_fraction() {
        assert_eq!(parse_price("125.5").unwrap(), 12550);
    }

    #[test]
    fn parse_zero() {
        assert_eq!(parse_price("0").unwrap(), 0);
        assert_eq!(parse_price("0.00").unwrap(), 0);
    }

    #[test]
    fn parse_trims_whitespace() {
        assert_eq!(parse_price(" 10.00 ").unwrap(), 1000);
    }

    #[test]
    fn reject_negative() {
        assert!(parse_price("-5").is_err());
    }

    #[test]
    fn reject_three_fraction_digits() {
        assert!(parse_price("1.234").is_err());
    }

    #[test]
    fn reject_garbage() {
        assert!(parse_price("").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price("1.2.3").is_err());
        assert!(parse_price("1,50").is_err());
    }

    #[test]
    fn format_round_trip() {
        assert_eq!(format_price(12550), "125.50");
        assert_eq!(format_price(100), "1.00");
        assert_eq!(format_price(5), "0.05");
        assert_eq!(parse_price(&format_price(98765)).unwrap(), 98765);
    }
}
