//! Confirmation records
//!
//! One record per attempted account operation, successful or declined.
//! Records are facts: once persisted they are never changed.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

/// Kind of an attempted operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Interest,
    Withdrawal,
    Declined,
}

impl TransactionType {
    /// Single-letter code used in confirmation numbers and storage
    pub fn code(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "D",
            TransactionType::Interest => "I",
            TransactionType::Withdrawal => "W",
            TransactionType::Declined => "X",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "D" => Some(TransactionType::Deposit),
            "I" => Some(TransactionType::Interest),
            "W" => Some(TransactionType::Withdrawal),
            "X" => Some(TransactionType::Declined),
            _ => None,
        }
    }

    /// Money flowing into the account
    pub fn is_inflow(&self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::Interest)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown transaction type code: {}", s))
    }
}

/// Record of one attempted operation.
///
/// Rendered with `Display` as the canonical confirmation number:
/// `{type}-{account}-{YYYYMMDDHHMMSS}-{sequence_id}-({amount})`, e.g.
/// `D-1234567890123456-20260301093000-42-(100.00)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    transaction_type: TransactionType,
    account_number: String,
    timestamp_utc: DateTime<Utc>,
    sequence_id: u64,
    amount: Money,
}

impl ConfirmationRecord {
    /// Start a record for an operation attempt. The amount is a zero
    /// placeholder until the operation succeeds.
    pub(crate) fn begin(
        transaction_type: TransactionType,
        account_number: String,
        timestamp_utc: DateTime<Utc>,
        sequence_id: u64,
    ) -> Self {
        Self {
            transaction_type,
            account_number,
            timestamp_utc,
            sequence_id,
            amount: Money::ZERO,
        }
    }

    /// Rebuild a record from stored fields
    pub fn from_parts(
        transaction_type: TransactionType,
        account_number: impl Into<String>,
        timestamp_utc: DateTime<Utc>,
        sequence_id: u64,
        amount: Money,
    ) -> Self {
        Self {
            transaction_type,
            account_number: account_number.into(),
            timestamp_utc,
            sequence_id,
            amount,
        }
    }

    /// Mark the attempt as declined. A decline never carries an amount.
    pub(crate) fn decline(&mut self) {
        self.transaction_type = TransactionType::Declined;
        self.amount = Money::ZERO;
    }

    pub(crate) fn settle(&mut self, amount: Money) {
        self.amount = amount;
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        self.timestamp_utc
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn is_declined(&self) -> bool {
        self.transaction_type == TransactionType::Declined
    }

    /// Canonical confirmation number
    pub fn confirmation_number(&self) -> String {
        self.to_string()
    }

    /// Timestamp shown in the account holder's zone, e.g.
    /// `2026-03-01 04:30:00 (UTC-0500)`.
    pub fn local_time(&self, offset: &FixedOffset) -> String {
        self.timestamp_utc
            .with_timezone(offset)
            .format("%Y-%m-%d %H:%M:%S (UTC%z)")
            .to_string()
    }
}

impl fmt::Display for ConfirmationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-({})",
            self.transaction_type.code(),
            self.account_number,
            self.timestamp_utc.format("%Y%m%d%H%M%S"),
            self.sequence_id,
            self.amount
        )
    }
}
