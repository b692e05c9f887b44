//! bank_ledger Library
//!
//! Re-exports modules for integration testing and external use.

pub mod account;
pub mod api;
pub mod domain;
pub mod ledger;

pub mod config;
pub mod db;
mod error;

pub use account::{change_monthly_interest_rate, Account, AccountError};
pub use config::{Config, ConfigError, LogFormat};
pub use domain::{
    AmountInput, Balance, ConfirmationRecord, DomainError, Money, MonthlyRate, OperationContext,
    TransactionType,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use ledger::{
    InMemoryLedger, LedgerError, LedgerStore, QueryWindow, SqliteLedger, TransactionCursor,
    TransactionFilter,
};
