//! Money type
//!
//! Fixed-point monetary values with exactly two fraction digits, plus the
//! parsing rules that turn loosely-typed caller input into money.
//! Every `Money` is scaled at construction, so two values compare equal
//! iff they are equal at two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fraction digits carried by every monetary value
pub const MONEY_SCALE: u32 = 2;

/// Money represents an exact decimal amount scaled to two fraction digits.
///
/// Money may be negative: a caller can hand in `-5` and the operation
/// decides whether to clamp or reject it. Balances use [`Balance`].
///
/// # Example
/// ```
/// use bank_ledger::domain::money::parse_amount;
///
/// let amount = parse_amount("60.98765").unwrap();
/// assert_eq!(amount.to_string(), "60.99");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Money(Decimal);

/// Errors that can occur when creating Money or Balance values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must be a number or a string representing a number (got {0:?})")]
    NotANumber(String),

    #[error("amount must not be empty")]
    Empty,

    #[error("amount is missing")]
    Missing,

    #[error("amount must be a single number, not a structured value")]
    Structured,

    #[error("balance must be a non-negative number (got {0})")]
    Negative(Decimal),

    #[error("cannot withdraw {requested}, available balance is {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("amount exceeds the representable range")]
    Overflow,
}

/// Scale a decimal to exactly two fraction digits, rounding half up.
pub fn scale(value: Decimal) -> Decimal {
    let mut scaled = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    scaled.rescale(MONEY_SCALE);
    scaled
}

impl Money {
    /// Zero, already at two fraction digits
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Create money from any decimal, scaling it to two fraction digits.
    pub fn new(value: Decimal) -> Self {
        Self(scale(value))
    }

    /// Parse caller input into money.
    ///
    /// # Errors
    /// - `MoneyError::NotANumber` for text or floats that are not finite numbers
    /// - `MoneyError::Empty` for empty or blank text
    /// - `MoneyError::Missing` for null / absent input
    /// - `MoneyError::Structured` for objects and arrays
    pub fn parse(input: &AmountInput) -> Result<Self, MoneyError> {
        let value = match input {
            AmountInput::Decimal(value) => *value,
            AmountInput::Integer(value) => Decimal::from(*value),
            AmountInput::Float(value) => {
                if !value.is_finite() {
                    return Err(MoneyError::NotANumber(value.to_string()));
                }
                // Exact binary value, so scaling rounds only once
                Decimal::from_f64_retain(*value).ok_or(MoneyError::Overflow)?
            }
            AmountInput::Text(text) => parse_decimal_text(text)?,
            AmountInput::Missing => return Err(MoneyError::Missing),
            AmountInput::Structured(_) => return Err(MoneyError::Structured),
        };

        Ok(Self::new(value))
    }

    /// Get the underlying Decimal value (always at scale 2).
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Negative amounts become zero; everything else is unchanged.
    pub fn floor_at_zero(self) -> Self {
        if self.is_negative() {
            Self::ZERO
        } else {
            self
        }
    }

    /// Multiply by a rate and round the product back to two digits.
    pub fn checked_mul_rate(&self, rate: Decimal) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(rate)
            .map(Money::new)
            .ok_or(MoneyError::Overflow)
    }
}

fn parse_decimal_text(text: &str) -> Result<Decimal, MoneyError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MoneyError::Empty);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| MoneyError::NotANumber(text.to_string()))
}

/// Parse anything convertible into [`AmountInput`] into money.
pub fn parse_amount(input: impl Into<AmountInput>) -> Result<Money, MoneyError> {
    Money::parse(&input.into())
}

/// True iff the input parses and scales to money without error.
///
/// Callers use this to tell "invalid input" apart from "valid but
/// negative or zero".
pub fn is_number(input: &AmountInput) -> bool {
    Money::parse(input).is_ok()
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal_text(s).map(Money::new)
    }
}

impl TryFrom<String> for Money {
    type Error = MoneyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Money::from_str(&value)
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

// =========================================================================
// AmountInput
// =========================================================================

/// Loosely-typed amount as supplied by a caller.
///
/// Deserializes from any JSON value so that malformed amounts reach the
/// account and are recorded as declined transactions instead of being
/// rejected by the transport layer.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum AmountInput {
    Decimal(Decimal),
    Integer(i64),
    Float(f64),
    Text(String),
    #[default]
    Missing,
    /// Objects and arrays; kept for logging only
    Structured(serde_json::Value),
}

impl From<Decimal> for AmountInput {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<Money> for AmountInput {
    fn from(value: Money) -> Self {
        Self::Decimal(value.value())
    }
}

impl From<i64> for AmountInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for AmountInput {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for AmountInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AmountInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AmountInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<AmountInput>> From<Option<T>> for AmountInput {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Missing)
    }
}

impl From<serde_json::Value> for AmountInput {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => Self::Missing,
            Value::Number(number) => {
                if let Some(i) = number.as_i64() {
                    Self::Integer(i)
                } else if let Some(u) = number.as_u64() {
                    Self::Decimal(Decimal::from(u))
                } else {
                    Self::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(text) => Self::Text(text),
            other @ (Value::Bool(_) | Value::Array(_) | Value::Object(_)) => Self::Structured(other),
        }
    }
}

impl fmt::Display for AmountInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountInput::Decimal(value) => write!(f, "{}", value),
            AmountInput::Integer(value) => write!(f, "{}", value),
            AmountInput::Float(value) => write!(f, "{}", value),
            AmountInput::Text(text) => write!(f, "{:?}", text),
            AmountInput::Missing => write!(f, "<missing>"),
            AmountInput::Structured(value) => write!(f, "{}", value),
        }
    }
}

// =========================================================================
// Balance
// =========================================================================

/// Balance represents an account balance (zero or positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(Money);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Money) -> Result<Self, MoneyError> {
        if value.is_negative() {
            return Err(MoneyError::Negative(value.value()));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Money::ZERO)
    }

    pub fn value(&self) -> Money {
        self.0
    }

    /// Check if balance covers a withdrawal of `amount`
    pub fn is_sufficient_for(&self, amount: Money) -> bool {
        self.0 >= amount
    }

    /// Add amount to balance. Negative credits are floored at zero.
    pub fn credit(&self, amount: Money) -> Result<Balance, MoneyError> {
        self.0
            .value()
            .checked_add(amount.floor_at_zero().value())
            .map(|sum| Balance(Money::new(sum)))
            .ok_or(MoneyError::Overflow)
    }

    /// Subtract amount from balance
    pub fn debit(&self, amount: Money) -> Result<Balance, MoneyError> {
        if !self.is_sufficient_for(amount) {
            return Err(MoneyError::InsufficientFunds {
                requested: amount.value(),
                available: self.0.value(),
            });
        }
        Balance::new(Money::new(self.0.value() - amount.value()))
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}
