//! In-memory Ledger Store
//!
//! Process-local implementation of the ledger contract. Useful for unit
//! tests (it records every save and can be told to fail) and for embedders
//! that do not need durability.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{ConfirmationRecord, DEFAULT_MONTHLY_RATE};

use super::store::{LedgerStore, QueryWindow, TransactionCursor, TransactionFilter};
use super::LedgerError;

/// Ledger operation that can be made to fail once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    NextTransactionId,
    SaveTransactionId,
    LoadRate,
    SaveRate,
    AddTransaction,
    Query,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    rate: Option<Decimal>,
    log: Vec<ConfirmationRecord>,
    id_saves: Vec<u64>,
    rate_saves: Vec<Decimal>,
    fail_next: Option<FailPoint>,
}

/// In-memory ledger guarded by a single mutex
#[derive(Debug)]
pub struct InMemoryLedger {
    state: Mutex<MemoryState>,
    default_rate: Decimal,
}

impl InMemoryLedger {
    /// Empty ledger: counter at 0, rate defaults to 0.05 on first use
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            default_rate: DEFAULT_MONTHLY_RATE,
        }
    }

    /// Start the counter at `next_id`
    pub fn with_next_transaction_id(self, next_id: u64) -> Self {
        self.lock_state().next_id = next_id;
        self
    }

    /// Preset the stored monthly rate
    pub fn with_monthly_interest_rate(self, rate: Decimal) -> Self {
        self.lock_state().rate = Some(rate);
        self
    }

    /// Make the next call of `point` fail with `LedgerError::Unavailable`
    pub fn fail_next(&self, point: FailPoint) {
        self.lock_state().fail_next = Some(point);
    }

    /// Id the next draw will return
    pub fn current_transaction_id(&self) -> u64 {
        self.lock_state().next_id
    }

    /// Every value passed to `save_transaction_id`, in call order
    pub fn saved_transaction_ids(&self) -> Vec<u64> {
        self.lock_state().id_saves.clone()
    }

    /// Every value passed to `save_monthly_interest_rate`, in call order
    pub fn saved_interest_rates(&self) -> Vec<Decimal> {
        self.lock_state().rate_saves.clone()
    }

    /// Full log in insertion order
    pub fn transactions(&self) -> Vec<ConfirmationRecord> {
        self.lock_state().log.clone()
    }

    pub fn last_transaction(&self) -> Option<ConfirmationRecord> {
        self.lock_state().log.last().cloned()
    }

    fn lock_state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state for an operation, honouring an armed fail point
    fn enter(&self, point: FailPoint) -> Result<MutexGuard<'_, MemoryState>, LedgerError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| LedgerError::Unavailable("ledger lock poisoned".to_string()))?;

        if state.fail_next == Some(point) {
            state.fail_next = None;
            return Err(LedgerError::Unavailable(format!("injected failure at {:?}", point)));
        }

        Ok(state)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn next_transaction_id(&self) -> Result<u64, LedgerError> {
        let mut state = self.enter(FailPoint::NextTransactionId)?;
        let id = state.next_id;
        state.next_id = id.checked_add(1).ok_or(LedgerError::SequenceOverflow(id))?;
        Ok(id)
    }

    async fn save_transaction_id(&self, next_id: u64) -> Result<(), LedgerError> {
        let mut state = self.enter(FailPoint::SaveTransactionId)?;
        state.id_saves.push(next_id);
        state.next_id = state.next_id.max(next_id);
        Ok(())
    }

    async fn load_monthly_interest_rate(&self) -> Result<Decimal, LedgerError> {
        let mut state = self.enter(FailPoint::LoadRate)?;
        Ok(*state.rate.get_or_insert(self.default_rate))
    }

    async fn save_monthly_interest_rate(&self, rate: Decimal) -> Result<(), LedgerError> {
        let mut state = self.enter(FailPoint::SaveRate)?;
        state.rate_saves.push(rate);
        state.rate = Some(rate);
        Ok(())
    }

    async fn add_transaction(&self, record: &ConfirmationRecord) -> Result<(), LedgerError> {
        let mut state = self.enter(FailPoint::AddTransaction)?;
        if state
            .log
            .iter()
            .any(|existing| existing.sequence_id() == record.sequence_id())
        {
            return Err(LedgerError::Unavailable(format!(
                "duplicate transaction id {}",
                record.sequence_id()
            )));
        }
        state.log.push(record.clone());
        Ok(())
    }

    async fn get_transactions_by_type(
        &self,
        account_number: &str,
        filter: TransactionFilter,
        window: QueryWindow,
    ) -> Result<TransactionCursor, LedgerError> {
        let state = self.enter(FailPoint::Query)?;
        let (start, end) = window.bounds(Utc::now());

        let mut records: Vec<ConfirmationRecord> = state
            .log
            .iter()
            .filter(|r| r.account_number() == account_number)
            .filter(|r| filter.matches(r.transaction_type()))
            .filter(|r| r.timestamp_utc() >= start && r.timestamp_utc() <= end)
            .cloned()
            .collect();

        records.sort_by(|a, b| {
            b.timestamp_utc()
                .cmp(&a.timestamp_utc())
                .then(b.sequence_id().cmp(&a.sequence_id()))
        });

        Ok(TransactionCursor::new(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Money, TransactionType};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn record(kind: TransactionType, account: &str, id: u64, days_ago: i64) -> ConfirmationRecord {
        ConfirmationRecord::from_parts(
            kind,
            account,
            Utc::now() - Duration::days(days_ago),
            id,
            Money::new(dec!(1)),
        )
    }

    #[tokio::test]
    async fn test_counter_defaults_to_zero_and_advances() {
        let ledger = InMemoryLedger::new();

        assert_eq!(ledger.next_transaction_id().await.unwrap(), 0);
        assert_eq!(ledger.next_transaction_id().await.unwrap(), 1);
        assert_eq!(ledger.current_transaction_id(), 2);
    }

    #[tokio::test]
    async fn test_save_never_moves_counter_backwards() {
        let ledger = InMemoryLedger::new().with_next_transaction_id(10);

        ledger.save_transaction_id(5).await.unwrap();
        assert_eq!(ledger.current_transaction_id(), 10);

        ledger.save_transaction_id(12).await.unwrap();
        assert_eq!(ledger.current_transaction_id(), 12);
        assert_eq!(ledger.saved_transaction_ids(), vec![5, 12]);
    }

    #[tokio::test]
    async fn test_rate_default_on_first_use() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.load_monthly_interest_rate().await.unwrap(), dec!(0.05));

        ledger.save_monthly_interest_rate(dec!(0.10)).await.unwrap();
        assert_eq!(ledger.load_monthly_interest_rate().await.unwrap(), dec!(0.10));
        assert_eq!(ledger.saved_interest_rates(), vec![dec!(0.10)]);
    }

    #[tokio::test]
    async fn test_fail_next_is_one_shot() {
        let ledger = InMemoryLedger::new();
        ledger.fail_next(FailPoint::NextTransactionId);

        assert!(matches!(
            ledger.next_transaction_id().await,
            Err(LedgerError::Unavailable(_))
        ));
        assert_eq!(ledger.next_transaction_id().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let ledger = InMemoryLedger::new();
        let first = record(TransactionType::Deposit, "A", 1, 0);

        ledger.add_transaction(&first).await.unwrap();
        assert!(ledger.add_transaction(&first).await.is_err());
        assert_eq!(ledger.transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let ledger = InMemoryLedger::new();
        ledger.add_transaction(&record(TransactionType::Deposit, "A", 1, 3)).await.unwrap();
        ledger.add_transaction(&record(TransactionType::Withdrawal, "A", 2, 2)).await.unwrap();
        ledger.add_transaction(&record(TransactionType::Interest, "A", 3, 1)).await.unwrap();
        ledger.add_transaction(&record(TransactionType::Declined, "A", 4, 0)).await.unwrap();
        ledger.add_transaction(&record(TransactionType::Deposit, "B", 5, 0)).await.unwrap();
        ledger.add_transaction(&record(TransactionType::Deposit, "A", 6, 20)).await.unwrap();

        let ids = |cursor: TransactionCursor| cursor.map(|r| r.sequence_id()).collect::<Vec<_>>();

        let all = ledger
            .get_transactions_by_type("A", TransactionFilter::All, QueryWindow::Week)
            .await
            .unwrap();
        assert_eq!(ids(all), vec![4, 3, 2, 1]);

        let inflow = ledger
            .get_transactions_by_type("A", TransactionFilter::In, QueryWindow::Month)
            .await
            .unwrap();
        assert_eq!(ids(inflow), vec![3, 1, 6]);

        let failed = ledger
            .get_transactions_by_type("A", TransactionFilter::Failed, QueryWindow::Week)
            .await
            .unwrap();
        assert_eq!(ids(failed), vec![4]);
    }

    #[tokio::test]
    async fn test_find_transactions_rejects_bogus_arguments() {
        let ledger = InMemoryLedger::new();

        let err = ledger.find_transactions("A", "Bogus", 7).await.unwrap_err();
        assert!(err.is_invalid_query());

        let err = ledger.find_transactions("A", "All", 14).await.unwrap_err();
        assert!(err.is_invalid_query());

        assert_eq!(ledger.find_transactions("A", "Out", 90).await.unwrap().count(), 0);
    }
}
