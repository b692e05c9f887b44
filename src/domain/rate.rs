//! Monthly interest rate
//!
//! A validated rate in the inclusive range `0.00 ..= 0.40`, carried at the
//! same two-digit scale as money.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::DomainError;
use super::money::{AmountInput, Money};

/// Highest accepted monthly rate (40%)
pub const MAX_MONTHLY_RATE: Decimal = Decimal::from_parts(40, 0, 0, false, 2);

/// Rate a fresh ledger starts with (5%)
pub const DEFAULT_MONTHLY_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthlyRate(Decimal);

impl MonthlyRate {
    /// Validate caller input as a monthly rate.
    ///
    /// # Errors
    /// `DomainError::InvalidRate` if the input is not a number, is negative,
    /// or exceeds [`MAX_MONTHLY_RATE`].
    pub fn parse(input: &AmountInput) -> Result<Self, DomainError> {
        let rate = Money::parse(input)
            .map_err(|e| DomainError::InvalidRate(e.to_string()))?
            .value();

        if rate < Decimal::ZERO {
            return Err(DomainError::InvalidRate(format!(
                "rate must not be negative (got {})",
                rate
            )));
        }

        if rate > MAX_MONTHLY_RATE {
            return Err(DomainError::InvalidRate(format!(
                "rate must not exceed {} (got {})",
                MAX_MONTHLY_RATE, rate
            )));
        }

        Ok(Self(rate))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for MonthlyRate {
    fn default() -> Self {
        Self(DEFAULT_MONTHLY_RATE)
    }
}

impl fmt::Display for MonthlyRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn parse(input: impl Into<AmountInput>) -> Result<MonthlyRate, DomainError> {
        MonthlyRate::parse(&input.into())
    }

    #[test]
    fn test_rate_valid() {
        assert_eq!(parse("0.06").unwrap().value(), dec!(0.06));
        assert_eq!(parse("0").unwrap().value(), dec!(0.00));
        assert_eq!(parse("0.40").unwrap().value(), dec!(0.40));
    }

    #[test]
    fn test_rate_scaled_to_two_digits() {
        assert_eq!(parse("0.06400").unwrap().value(), dec!(0.06));
        assert_eq!(parse("0.06500").unwrap().value(), dec!(0.07));
    }

    #[test]
    fn test_rate_rejects_out_of_range() {
        assert!(matches!(parse("0.41"), Err(DomainError::InvalidRate(_))));
        assert!(matches!(parse("-0.01"), Err(DomainError::InvalidRate(_))));
    }

    #[test]
    fn test_rate_rejects_non_numbers() {
        assert!(parse("invalid_interest").is_err());
        assert!(parse("").is_err());
        assert!(parse(AmountInput::Missing).is_err());
        assert!(parse(json!({"a": 1})).is_err());
        assert!(parse(json!([1, 2])).is_err());
    }

    #[test]
    fn test_default_rate() {
        assert_eq!(MonthlyRate::default().value(), dec!(0.05));
        assert_eq!(MonthlyRate::default().to_string(), "0.05");
    }
}
