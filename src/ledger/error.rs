//! Ledger Store Errors
//!
//! Error types for ledger store operations.

/// Errors that can occur in the ledger store
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Unsupported transaction type or time window in a query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be decoded
    #[error("Corrupt ledger row: {0}")]
    CorruptRow(String),

    /// Transaction id does not fit the storage column
    #[error("Transaction id {0} exceeds the storage range")]
    SequenceOverflow(u64),

    /// Backend unavailable (in-memory store failure or poisoned lock)
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery(message.into())
    }

    /// Check if this error is an argument error rather than a backend failure
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, LedgerError::InvalidQuery(_))
    }
}
