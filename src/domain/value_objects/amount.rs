//! # Quote Amount
//!
//! Decimal amount quoted by a provider.
//!
//! An amount must be strictly positive with at most 16 integer digits and
//! at most 2 fraction digits (trailing zeros are ignored, so `1500.000` is
//! accepted as `1500`).
//!
//! # Examples
//!
//! ```
//! use matching_service::domain::value_objects::amount::QuoteAmount;
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! let amount = QuoteAmount::new(Decimal::from_str("1500.00").unwrap()).unwrap();
//! assert_eq!(amount.get(), Decimal::from(1500));
//!
//! assert!(QuoteAmount::new(Decimal::ZERO).is_err());
//! assert!(QuoteAmount::new(Decimal::from_str("10.005").unwrap()).is_err());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of integer digits.
pub const MAX_INTEGER_DIGITS: u32 = 16;

/// Maximum number of fraction digits.
pub const MAX_FRACTION_DIGITS: u32 = 2;

/// A validated, strictly positive quote amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct QuoteAmount(Decimal);

impl QuoteAmount {
    /// Validates and wraps a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidAmount` if the amount is not positive or
    /// exceeds the allowed precision.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidAmount(format!(
                "amount must be positive, got {}",
                value
            )));
        }

        let normalized = value.normalize();
        if normalized.scale() > MAX_FRACTION_DIGITS {
            return Err(DomainError::InvalidAmount(format!(
                "amount {} has more than {} fraction digits",
                value, MAX_FRACTION_DIGITS
            )));
        }

        let limit = Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS));
        if normalized.trunc() >= limit {
            return Err(DomainError::InvalidAmount(format!(
                "amount {} has more than {} integer digits",
                value, MAX_INTEGER_DIGITS
            )));
        }

        Ok(Self(value))
    }

    /// Returns the inner decimal.
    #[inline]
    #[must_use]
    pub fn get(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for QuoteAmount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuoteAmount> for Decimal {
    fn from(amount: QuoteAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for QuoteAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn accepts_two_fraction_digits() {
        assert!(QuoteAmount::new(dec("1500.00")).is_ok());
        assert!(QuoteAmount::new(dec("0.01")).is_ok());
    }

    #[test]
    fn trailing_zeros_do_not_count() {
        assert!(QuoteAmount::new(dec("12.3400")).is_ok());
    }

    #[test]
    fn rejects_non_positive() {
        assert!(QuoteAmount::new(Decimal::ZERO).is_err());
        assert!(QuoteAmount::new(dec("-1")).is_err());
    }

    #[test]
    fn rejects_three_fraction_digits() {
        let err = QuoteAmount::new(dec("10.005")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidAmount(_)));
    }

    #[test]
    fn deserialization_validates() {
        let amount: QuoteAmount = serde_json::from_str("\"1500.50\"").unwrap();
        assert_eq!(amount.get(), dec("1500.50"));

        assert!(serde_json::from_str::<QuoteAmount>("\"0\"").is_err());
        assert!(serde_json::from_str::<QuoteAmount>("\"-3\"").is_err());
        assert!(serde_json::from_str::<QuoteAmount>("\"1.999\"").is_err());
    }

    #[test]
    fn integer_digit_boundary() {
        assert!(QuoteAmount::new(dec("9999999999999999.99")).is_ok());
        assert!(QuoteAmount::new(dec("10000000000000000")).is_err());
    }
}
