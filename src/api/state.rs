//! Shared application state
//!
//! Owns the ledger and the registry of open accounts. Each account sits
//! behind its own `tokio::sync::Mutex`, so operations on one account run one
//! at a time while different accounts proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::account::{generate_account_number, parse_time_zone, Account};
use crate::domain::AmountInput;
use crate::error::{AppError, AppResult};
use crate::ledger::SqliteLedger;

/// Attempts at drawing an unused account number before giving up
const MAX_NUMBER_ATTEMPTS: usize = 5;

pub type SharedAccount = Arc<Mutex<Account<SqliteLedger>>>;

#[derive(Debug, Clone)]
pub struct AppState {
    ledger: Arc<SqliteLedger>,
    accounts: Arc<Mutex<HashMap<String, SharedAccount>>>,
}

impl AppState {
    pub fn new(ledger: SqliteLedger) -> Self {
        Self {
            ledger: Arc::new(ledger),
            accounts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn ledger(&self) -> &Arc<SqliteLedger> {
        &self.ledger
    }

    /// Open a new account under a fresh number and persist its snapshot
    pub async fn open_account(
        &self,
        starting_balance: AmountInput,
        time_zone: Option<&str>,
    ) -> AppResult<SharedAccount> {
        let time_zone = time_zone.map(parse_time_zone).transpose()?;
        let account_number = self.unused_account_number().await?;

        let mut account = Account::new(account_number.clone(), starting_balance, self.ledger.clone())?;
        if let Some(time_zone) = time_zone {
            account = account.with_time_zone(time_zone);
        }

        self.ledger.save_account(&account.snapshot()).await?;
        tracing::info!(
            account_number = %account_number,
            balance = %account.balance(),
            "Account opened"
        );

        let shared = Arc::new(Mutex::new(account));
        self.accounts
            .lock()
            .await
            .insert(account_number, shared.clone());

        Ok(shared)
    }

    /// Look up an open account, restoring it from its snapshot if this
    /// process has not seen it yet.
    ///
    /// Restored accounts stay registered for the life of the process.
    pub async fn account(&self, account_number: &str) -> AppResult<SharedAccount> {
        if let Some(account) = self.accounts.lock().await.get(account_number) {
            return Ok(account.clone());
        }

        let snapshot = self
            .ledger
            .load_account(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))?;

        let account = Account::restore(&snapshot, self.ledger.clone())?;

        // A concurrent lookup may have restored it first; keep that instance
        let mut accounts = self.accounts.lock().await;
        let shared = accounts
            .entry(account_number.to_string())
            .or_insert_with(|| {
                tracing::debug!(account_number, balance = %account.balance(), "Account restored");
                Arc::new(Mutex::new(account))
            })
            .clone();

        Ok(shared)
    }

    /// Write the account's committed balance back to its snapshot row.
    ///
    /// Runs after the ledger has accepted the operation, so a failure here
    /// is logged and does not fail the operation.
    pub async fn persist(&self, account: &Account<SqliteLedger>) {
        if let Err(e) = self.ledger.save_account(&account.snapshot()).await {
            tracing::error!(
                account_number = %account.account_number(),
                balance = %account.balance(),
                error = %e,
                "Failed to update account snapshot"
            );
        }
    }

    async fn unused_account_number(&self) -> AppResult<String> {
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let candidate = generate_account_number();
            if self.ledger.load_account(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(AppError::Internal(
            "could not draw an unused account number".to_string(),
        ))
    }
}
