//! Account operation errors

use crate::domain::{ConfirmationRecord, DomainError};
use crate::ledger::LedgerError;

/// Failure of an account operation: either a business rule refused it or
/// the ledger could not complete it.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Ledger(#[from] LedgerError),
}

impl AccountError {
    pub fn is_declined(&self) -> bool {
        matches!(self, Self::Domain(err) if err.is_declined())
    }

    /// The persisted Declined record, if this is a decline
    pub fn declined_record(&self) -> Option<&ConfirmationRecord> {
        match self {
            Self::Domain(err) => err.declined_record(),
            Self::Ledger(_) => None,
        }
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Ledger(_))
    }
}
