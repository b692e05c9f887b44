//! Ledger Store contract
//!
//! The persistence boundary consumed by accounts: the monotonic
//! transaction-id counter, the monthly interest rate, and the append-only
//! transaction log.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::domain::{ConfirmationRecord, TransactionType};

use super::LedgerError;

/// Which records a ledger query returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionFilter {
    All,
    /// Deposits and interest
    In,
    /// Withdrawals
    Out,
    /// Declined attempts
    Failed,
}

impl TransactionFilter {
    pub fn matches(&self, transaction_type: TransactionType) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::In => transaction_type.is_inflow(),
            TransactionFilter::Out => transaction_type == TransactionType::Withdrawal,
            TransactionFilter::Failed => transaction_type == TransactionType::Declined,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionFilter::All => "All",
            TransactionFilter::In => "In",
            TransactionFilter::Out => "Out",
            TransactionFilter::Failed => "Failed",
        }
    }
}

impl FromStr for TransactionFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(TransactionFilter::All),
            "In" => Ok(TransactionFilter::In),
            "Out" => Ok(TransactionFilter::Out),
            "Failed" => Ok(TransactionFilter::Failed),
            other => Err(LedgerError::invalid_query(format!(
                "Invalid transaction type: {:?} (expected All, In, Out or Failed)",
                other
            ))),
        }
    }
}

impl fmt::Display for TransactionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far back a ledger query looks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryWindow {
    Week,
    Month,
    Quarter,
}

impl QueryWindow {
    pub fn days(&self) -> u32 {
        match self {
            QueryWindow::Week => 7,
            QueryWindow::Month => 30,
            QueryWindow::Quarter => 90,
        }
    }

    /// Inclusive `[start, end]` bounds ending at `now`
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - Duration::days(i64::from(self.days())), now)
    }
}

impl TryFrom<u32> for QueryWindow {
    type Error = LedgerError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            7 => Ok(QueryWindow::Week),
            30 => Ok(QueryWindow::Month),
            90 => Ok(QueryWindow::Quarter),
            other => Err(LedgerError::invalid_query(format!(
                "Invalid time range: {} days (expected 7, 30 or 90)",
                other
            ))),
        }
    }
}

/// Finite, single-pass sequence of records produced by a ledger query,
/// newest first.
#[derive(Debug)]
pub struct TransactionCursor {
    records: std::vec::IntoIter<ConfirmationRecord>,
}

impl TransactionCursor {
    pub fn new(records: Vec<ConfirmationRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for TransactionCursor {
    type Item = ConfirmationRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for TransactionCursor {}

/// Ledger Store trait - durable keeper of the id counter, interest rate and
/// transaction log.
///
/// Implementations:
/// - `SqliteLedger`: durable storage in SQLite
/// - `InMemoryLedger`: process-local storage for tests and embedding
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Draw the next transaction id. The id is consumed: the counter is
    /// advanced in the same step, so concurrent callers never share an id.
    async fn next_transaction_id(&self) -> Result<u64, LedgerError>;

    /// Persist the counter. The counter never moves backwards: saving a
    /// value lower than the current one is a no-op.
    async fn save_transaction_id(&self, next_id: u64) -> Result<(), LedgerError>;

    /// Current monthly rate; the store's default is saved on first use.
    async fn load_monthly_interest_rate(&self) -> Result<Decimal, LedgerError>;

    async fn save_monthly_interest_rate(&self, rate: Decimal) -> Result<(), LedgerError>;

    /// Append one record to the log
    async fn add_transaction(&self, record: &ConfirmationRecord) -> Result<(), LedgerError>;

    /// Records of one account matching `filter` inside `window`, newest first
    async fn get_transactions_by_type(
        &self,
        account_number: &str,
        filter: TransactionFilter,
        window: QueryWindow,
    ) -> Result<TransactionCursor, LedgerError>;

    /// String-typed query as received from callers.
    ///
    /// # Errors
    /// `LedgerError::InvalidQuery` for any type other than All/In/Out/Failed
    /// or any window other than 7/30/90 days.
    async fn find_transactions(
        &self,
        account_number: &str,
        transaction_type: &str,
        window_days: u32,
    ) -> Result<TransactionCursor, LedgerError> {
        let filter: TransactionFilter = transaction_type.parse()?;
        let window = QueryWindow::try_from(window_days)?;
        self.get_transactions_by_type(account_number, filter, window)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use chrono::TimeZone;

    #[test]
    fn test_filter_parse() {
        assert_eq!("All".parse::<TransactionFilter>().unwrap(), TransactionFilter::All);
        assert_eq!("In".parse::<TransactionFilter>().unwrap(), TransactionFilter::In);
        assert_eq!("Out".parse::<TransactionFilter>().unwrap(), TransactionFilter::Out);
        assert_eq!("Failed".parse::<TransactionFilter>().unwrap(), TransactionFilter::Failed);

        for bad in ["Bogus", "all", "", "In "] {
            let err = bad.parse::<TransactionFilter>().unwrap_err();
            assert!(err.is_invalid_query(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_filter_matches() {
        use TransactionType::*;

        assert!(TransactionFilter::In.matches(Deposit));
        assert!(TransactionFilter::In.matches(Interest));
        assert!(!TransactionFilter::In.matches(Withdrawal));
        assert!(TransactionFilter::Out.matches(Withdrawal));
        assert!(!TransactionFilter::Out.matches(Declined));
        assert!(TransactionFilter::Failed.matches(Declined));
        assert!(TransactionFilter::All.matches(Declined));
    }

    #[test]
    fn test_window_parse() {
        assert_eq!(QueryWindow::try_from(7).unwrap(), QueryWindow::Week);
        assert_eq!(QueryWindow::try_from(30).unwrap(), QueryWindow::Month);
        assert_eq!(QueryWindow::try_from(90).unwrap(), QueryWindow::Quarter);

        for bad in [0, 1, 8, 31, 365] {
            assert!(QueryWindow::try_from(bad).unwrap_err().is_invalid_query());
        }
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc.with_ymd_and_hms(2026, 4, 30, 12, 0, 0).unwrap();
        let (start, end) = QueryWindow::Month.bounds(now);

        assert_eq!(end, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_cursor_is_single_pass() {
        let record = ConfirmationRecord::from_parts(
            TransactionType::Deposit,
            "1",
            Utc::now(),
            1,
            Money::ZERO,
        );
        let mut cursor = TransactionCursor::new(vec![record.clone(), record]);

        assert_eq!(cursor.len(), 2);
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_some());
        assert!(cursor.next().is_none());
        assert_eq!(TransactionCursor::empty().count(), 0);
    }
}
