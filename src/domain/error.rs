//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use rust_decimal::Decimal;
use thiserror::Error;

use super::confirmation::ConfirmationRecord;
use super::money::Money;

/// Why an operation was declined
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclineReason {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid amount: amount must be a positive number (got {0})")]
    NotPositive(Money),

    #[error("Invalid amount: cannot withdraw {requested}, balance is {available}")]
    InsufficientFunds { requested: Money, available: Money },

    #[error("Invalid amount: resulting balance is out of range")]
    Overflow,
}

/// Business rule violations for account operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// The operation was refused; `record` is the persisted Declined record
    #[error("Transaction declined ({record}): {reason}")]
    Declined {
        reason: DeclineReason,
        record: ConfirmationRecord,
    },

    /// Monthly interest rate change rejected
    #[error("Invalid monthly interest rate: {0}")]
    InvalidRate(String),

    /// Starting balance rejected at account construction
    #[error("Invalid balance: {0}")]
    InvalidBalance(String),

    /// Time zone could not be parsed
    #[error("Invalid time zone: {0}")]
    InvalidTimeZone(String),
}

impl DomainError {
    pub fn declined(reason: DeclineReason, record: ConfirmationRecord) -> Self {
        Self::Declined { reason, record }
    }

    /// Check if this is a decline (a record was still persisted)
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Declined { .. })
    }

    /// The persisted Declined record, if any
    pub fn declined_record(&self) -> Option<&ConfirmationRecord> {
        match self {
            Self::Declined { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Check if this is an argument error (nothing was persisted)
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRate(_) | Self::InvalidBalance(_) | Self::InvalidTimeZone(_)
        )
    }
}

impl DeclineReason {
    pub fn insufficient_funds(requested: Money, available: Money) -> Self {
        Self::InsufficientFunds {
            requested,
            available,
        }
    }

    /// Requested amount, when one was parsed
    pub fn requested(&self) -> Option<Decimal> {
        match self {
            Self::NotPositive(amount) => Some(amount.value()),
            Self::InsufficientFunds { requested, .. } => Some(requested.value()),
            _ => None,
        }
    }
}
