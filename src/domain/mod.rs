//! Domain module
//!
//! Core domain types: money, rates, confirmation records and errors.

pub mod confirmation;
pub mod context;
pub mod error;
pub mod money;
pub mod rate;

pub use confirmation::{ConfirmationRecord, TransactionType};
pub use context::OperationContext;
pub use error::{DeclineReason, DomainError};
pub use money::{is_number, parse_amount, AmountInput, Balance, Money, MoneyError};
pub use rate::{MonthlyRate, DEFAULT_MONTHLY_RATE, MAX_MONTHLY_RATE};
