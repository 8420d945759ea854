//! Decimal string <-> smallest-unit conversion for amounts crossing the
//! HTTP boundary and configured in the YAML config file.
//!
//! The wallet's smallest integer unit is defined as `10^12` of one display
//! unit. Conversion rounds away from zero. `rust_decimal`'s 96-bit
//! significand is narrower than the 256-bit precision of the system this
//! server implements; for any amount that fits in a `u64` smallest-unit
//! value the two agree, so the substitution is accepted rather than pulling
//! in a bignum decimal crate for headroom no real payment needs.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

const SCALE: u32 = 12;

/// Parse a decimal string (up to 12 fractional digits) into the wallet's
/// smallest integer unit.
///
/// # Errors
///
/// Returns [`DecimalError::Malformed`] if `s` is not a valid decimal, or
/// [`DecimalError::Overflow`] if the scaled value does not fit in a `u64`.
pub fn to_units(s: &str) -> Result<u64, DecimalError> {
    let value: Decimal = s.parse().map_err(|_| DecimalError::Malformed(s.to_string()))?;
    let scale_factor = Decimal::from_i128_with_scale(10i128.pow(SCALE), 0);
    let scaled = (value * scale_factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    scaled
        .to_string()
        .parse()
        .map_err(|_| DecimalError::Overflow(s.to_string()))
}

/// Format the wallet's smallest integer unit back into a decimal string.
#[must_use]
pub fn to_decimal_string(units: u64) -> String {
    Decimal::from_i128_with_scale(i128::from(units), SCALE).normalize().to_string()
}

/// An error converting between decimal strings and smallest-unit integers.
#[derive(Error, Debug)]
pub enum DecimalError {
    /// The string was not a valid decimal.
    #[error("malformed decimal amount: {0}")]
    Malformed(String),
    /// The scaled value does not fit in a `u64`.
    #[error("decimal amount out of range: {0}")]
    Overflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_whole_units() {
        assert_eq!(to_units("1").unwrap(), 1_000_000_000_000);
    }

    #[test]
    fn converts_smallest_fractional_unit() {
        assert_eq!(to_units("0.000000000001").unwrap(), 1);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(to_units("not-a-number").is_err());
    }

    #[test]
    fn formats_back_to_decimal_string() {
        assert_eq!(to_decimal_string(1_000_000_000_000), "1");
        assert_eq!(to_decimal_string(1_500_000_000_000), "1.5");
        assert_eq!(to_decimal_string(0), "0");
    }

    #[test]
    fn round_trips_within_twelve_digit_resolution() {
        for s in ["1", "0.1", "123.456789012", "0.000000000001", "999999.999999999999"] {
            let units = to_units(s).unwrap();
            let back = to_decimal_string(units);
            assert_eq!(to_units(&back).unwrap(), units, "round trip of {s}");
        }
    }
}
