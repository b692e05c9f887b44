//! Account
//!
//! A single bank account. Holds the current balance and runs each operation
//! end to end against the ledger:
//!
//! 1. draw a transaction id and persist `id + 1`
//! 2. build a confirmation record for the attempt
//! 3. validate; a refused attempt is persisted as Declined
//! 4. persist the realized record, then commit the new balance

use chrono::{FixedOffset, Utc};
use std::sync::Arc;

use crate::domain::{
    AmountInput, Balance, ConfirmationRecord, DeclineReason, DomainError, Money, TransactionType,
};
use crate::ledger::{AccountSnapshot, LedgerError, LedgerStore};

use super::number::{format_time_zone, parse_time_zone, utc};
use super::AccountError;

/// Account bound to a ledger store
///
/// The balance is never negative and only changes through `deposit`,
/// `withdraw` and `apply_interest`, after the ledger has accepted the
/// corresponding record.
#[derive(Debug)]
pub struct Account<S: LedgerStore + ?Sized> {
    account_number: String,
    balance: Balance,
    time_zone: FixedOffset,
    ledger: Arc<S>,
    /// Records produced by this instance, declines included
    transactions: Vec<ConfirmationRecord>,
}

impl<S: LedgerStore + ?Sized> Account<S> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Open an account with a starting balance.
    ///
    /// # Errors
    /// `DomainError::InvalidBalance` if the balance is not a number or is
    /// negative.
    pub fn new(
        account_number: impl Into<String>,
        starting_balance: impl Into<AmountInput>,
        ledger: Arc<S>,
    ) -> Result<Self, DomainError> {
        let input = starting_balance.into();
        let balance = Money::parse(&input)
            .and_then(Balance::new)
            .map_err(|e| DomainError::InvalidBalance(e.to_string()))?;

        Ok(Self {
            account_number: account_number.into(),
            balance,
            time_zone: utc(),
            ledger,
            transactions: Vec::new(),
        })
    }

    /// Zone used when displaying timestamps. Stored times stay UTC.
    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Rebuild an account from its persisted snapshot
    pub fn restore(snapshot: &AccountSnapshot, ledger: Arc<S>) -> Result<Self, DomainError> {
        let time_zone = parse_time_zone(&snapshot.time_zone)?;
        Ok(Self::new(snapshot.account_number.clone(), snapshot.balance, ledger)?
            .with_time_zone(time_zone))
    }

    /// Snapshot of the committed state, stamped as opened now
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            account_number: self.account_number.clone(),
            time_zone: format_time_zone(&self.time_zone),
            balance: self.balance.value().value(),
            opened_at: Utc::now(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn balance(&self) -> Money {
        self.balance.value()
    }

    pub fn time_zone(&self) -> &FixedOffset {
        &self.time_zone
    }

    pub fn ledger(&self) -> &Arc<S> {
        &self.ledger
    }

    /// Records produced by this instance, oldest first
    pub fn transactions(&self) -> &[ConfirmationRecord] {
        &self.transactions
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Deposit money. Negative amounts are clamped to zero, so a deposit of
    /// `-5` succeeds with a realized amount of `0.00`.
    ///
    /// # Errors
    /// - `DomainError::Declined` if the amount is not a number
    /// - `LedgerError` if the ledger fails; the balance is unchanged
    #[tracing::instrument(
        name = "deposit",
        skip(self, amount),
        fields(account_number = %self.account_number)
    )]
    pub async fn deposit(
        &mut self,
        amount: impl Into<AmountInput>,
    ) -> Result<ConfirmationRecord, AccountError> {
        let input = amount.into();
        let record = self.begin(TransactionType::Deposit).await?;

        let amount = match Money::parse(&input) {
            Ok(amount) => amount.floor_at_zero(),
            Err(e) => {
                return Err(self
                    .decline(record, DeclineReason::InvalidAmount(e.to_string()))
                    .await)
            }
        };

        let balance = match self.balance.credit(amount) {
            Ok(balance) => balance,
            Err(_) => return Err(self.decline(record, DeclineReason::Overflow).await),
        };

        self.commit(record, amount, balance).await
    }

    /// Withdraw money.
    ///
    /// # Errors
    /// - `DomainError::Declined` if the amount is not a number, is not
    ///   positive, or exceeds the balance
    /// - `LedgerError` if the ledger fails; the balance is unchanged
    #[tracing::instrument(
        name = "withdraw",
        skip(self, amount),
        fields(account_number = %self.account_number)
    )]
    pub async fn withdraw(
        &mut self,
        amount: impl Into<AmountInput>,
    ) -> Result<ConfirmationRecord, AccountError> {
        let input = amount.into();
        let record = self.begin(TransactionType::Withdrawal).await?;

        let amount = match Money::parse(&input) {
            Ok(amount) => amount,
            Err(e) => {
                return Err(self
                    .decline(record, DeclineReason::InvalidAmount(e.to_string()))
                    .await)
            }
        };

        if !amount.is_positive() {
            return Err(self.decline(record, DeclineReason::NotPositive(amount)).await);
        }

        let balance = match self.balance.debit(amount) {
            Ok(balance) => balance,
            Err(_) => {
                let reason = DeclineReason::insufficient_funds(amount, self.balance.value());
                return Err(self.decline(record, reason).await);
            }
        };

        self.commit(record, amount, balance).await
    }

    /// Credit one month of interest at the ledger's current rate:
    /// `round(balance * rate, 2)`.
    ///
    /// # Errors
    /// `LedgerError` if the ledger fails; the balance is unchanged
    #[tracing::instrument(
        name = "apply_interest",
        skip(self),
        fields(account_number = %self.account_number)
    )]
    pub async fn apply_interest(&mut self) -> Result<ConfirmationRecord, AccountError> {
        let record = self.begin(TransactionType::Interest).await?;
        let rate = self.ledger.load_monthly_interest_rate().await?;

        let interest = match self.balance.value().checked_mul_rate(rate) {
            Ok(interest) => interest.floor_at_zero(),
            Err(_) => return Err(self.decline(record, DeclineReason::Overflow).await),
        };

        let balance = match self.balance.credit(interest) {
            Ok(balance) => balance,
            Err(_) => return Err(self.decline(record, DeclineReason::Overflow).await),
        };

        tracing::debug!(rate = %rate, interest = %interest, "Interest computed");
        self.commit(record, interest, balance).await
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Draw the next id, advance the stored counter, and start the record
    async fn begin(
        &self,
        transaction_type: TransactionType,
    ) -> Result<ConfirmationRecord, LedgerError> {
        let sequence_id = self.ledger.next_transaction_id().await?;
        let next_id = sequence_id
            .checked_add(1)
            .ok_or(LedgerError::SequenceOverflow(sequence_id))?;
        self.ledger.save_transaction_id(next_id).await?;

        Ok(ConfirmationRecord::begin(
            transaction_type,
            self.account_number.clone(),
            Utc::now(),
            sequence_id,
        ))
    }

    /// Persist the attempt as Declined and build the error to return
    async fn decline(
        &mut self,
        mut record: ConfirmationRecord,
        reason: DeclineReason,
    ) -> AccountError {
        record.decline();

        if let Err(e) = self.ledger.add_transaction(&record).await {
            tracing::error!(sequence_id = record.sequence_id(), error = %e, "Failed to record decline");
            return e.into();
        }

        tracing::warn!(
            sequence_id = record.sequence_id(),
            confirmation = %record,
            reason = %reason,
            "Transaction declined"
        );

        self.transactions.push(record.clone());
        DomainError::declined(reason, record).into()
    }

    /// Persist the realized record, then apply the new balance
    async fn commit(
        &mut self,
        mut record: ConfirmationRecord,
        amount: Money,
        balance: Balance,
    ) -> Result<ConfirmationRecord, AccountError> {
        record.settle(amount);
        self.ledger.add_transaction(&record).await?;

        self.balance = balance;
        self.transactions.push(record.clone());

        tracing::info!(
            sequence_id = record.sequence_id(),
            transaction_type = %record.transaction_type(),
            amount = %amount,
            balance = %self.balance,
            "Transaction recorded"
        );

        Ok(record)
    }
}
