//! Integration tests for the SQLite ledger store and accounts running on it

use std::collections::HashSet;
use std::sync::Arc;

use bank_ledger::domain::{ConfirmationRecord, Money, TransactionType};
use bank_ledger::ledger::AccountSnapshot;
use bank_ledger::{
    change_monthly_interest_rate, db, Account, LedgerError, LedgerStore, QueryWindow,
    SqliteLedger, TransactionFilter,
};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

mod common;

fn record(kind: TransactionType, account: &str, id: u64, age: Duration) -> ConfirmationRecord {
    ConfirmationRecord::from_parts(kind, account, Utc::now() - age, id, Money::new(dec!(10)))
}

#[tokio::test]
async fn test_counter_starts_at_zero_and_advances() {
    let ledger = common::setup_ledger().await;

    assert_eq!(ledger.next_transaction_id().await.unwrap(), 0);
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 1);
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 2);
}

#[tokio::test]
async fn test_current_transaction_id_does_not_consume() {
    let ledger = common::setup_ledger().await;
    assert_eq!(ledger.current_transaction_id().await.unwrap(), 0);
    assert_eq!(ledger.current_transaction_id().await.unwrap(), 0);

    assert_eq!(ledger.next_transaction_id().await.unwrap(), 0);
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 1);
    assert_eq!(ledger.current_transaction_id().await.unwrap(), 2);
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 2);

    ledger.save_transaction_id(40).await.unwrap();
    assert_eq!(ledger.current_transaction_id().await.unwrap(), 40);
}

#[tokio::test]
async fn test_save_transaction_id_only_raises_counter() {
    let ledger = common::setup_ledger().await;

    ledger.save_transaction_id(10).await.unwrap();
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 10);

    // Lower value is ignored: counter is now 11
    ledger.save_transaction_id(3).await.unwrap();
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 11);

    assert!(matches!(
        ledger.save_transaction_id(u64::MAX).await,
        Err(LedgerError::SequenceOverflow(_))
    ));
}

#[tokio::test]
async fn test_rate_defaults_and_persists() {
    let ledger = common::setup_ledger().await;
    assert_eq!(ledger.load_monthly_interest_rate().await.unwrap(), dec!(0.05));

    ledger.save_monthly_interest_rate(dec!(0.12)).await.unwrap();
    assert_eq!(ledger.load_monthly_interest_rate().await.unwrap(), dec!(0.12));
}

#[tokio::test]
async fn test_configured_default_rate() {
    let ledger = SqliteLedger::new(common::setup_test_db().await).with_default_rate(dec!(0.02));
    assert_eq!(ledger.load_monthly_interest_rate().await.unwrap(), dec!(0.02));
}

#[tokio::test]
async fn test_duplicate_sequence_id_is_storage_error() {
    let ledger = common::setup_ledger().await;
    let first = record(TransactionType::Deposit, "A", 1, Duration::zero());

    ledger.add_transaction(&first).await.unwrap();
    let err = ledger.add_transaction(&first).await.unwrap_err();
    assert!(matches!(err, LedgerError::Database(_)));
}

#[tokio::test]
async fn test_query_filters_windows_and_orders() {
    let ledger = common::setup_ledger().await;

    let rows = [
        record(TransactionType::Deposit, "A", 1, Duration::days(3)),
        record(TransactionType::Withdrawal, "A", 2, Duration::days(2)),
        record(TransactionType::Interest, "A", 3, Duration::days(1)),
        record(TransactionType::Declined, "A", 4, Duration::hours(1)),
        record(TransactionType::Deposit, "B", 5, Duration::hours(1)),
        record(TransactionType::Deposit, "A", 6, Duration::days(20)),
        record(TransactionType::Withdrawal, "A", 7, Duration::days(60)),
        record(TransactionType::Deposit, "A", 8, Duration::days(120)),
    ];
    for row in &rows {
        ledger.add_transaction(row).await.unwrap();
    }

    let ids = |cursor: bank_ledger::TransactionCursor| {
        cursor.map(|r| r.sequence_id()).collect::<Vec<_>>()
    };

    let week = ledger
        .get_transactions_by_type("A", TransactionFilter::All, QueryWindow::Week)
        .await
        .unwrap();
    assert_eq!(ids(week), vec![4, 3, 2, 1]);

    let month_in = ledger
        .get_transactions_by_type("A", TransactionFilter::In, QueryWindow::Month)
        .await
        .unwrap();
    assert_eq!(ids(month_in), vec![3, 1, 6]);

    let quarter_out = ledger
        .get_transactions_by_type("A", TransactionFilter::Out, QueryWindow::Quarter)
        .await
        .unwrap();
    assert_eq!(ids(quarter_out), vec![2, 7]);

    let failed = ledger.find_transactions("A", "Failed", 7).await.unwrap();
    assert_eq!(ids(failed), vec![4]);
}

#[tokio::test]
async fn test_query_rejects_unknown_type_and_window() {
    let ledger = common::setup_ledger().await;

    let err = ledger.find_transactions("A", "Bogus", 7).await.unwrap_err();
    assert!(err.is_invalid_query());

    let err = ledger.find_transactions("A", "All", 14).await.unwrap_err();
    assert!(err.is_invalid_query());
}

#[tokio::test]
async fn test_records_round_trip_through_storage() {
    let ledger = common::setup_ledger().await;
    let original = ConfirmationRecord::from_parts(
        TransactionType::Interest,
        "1234567890123456",
        Utc::now(),
        42,
        Money::new(dec!(250)),
    );

    ledger.add_transaction(&original).await.unwrap();

    let mut found = ledger
        .find_transactions("1234567890123456", "In", 7)
        .await
        .unwrap();
    let stored = found.next().unwrap();

    assert_eq!(stored, original);
    assert_eq!(stored.to_string(), original.to_string());
    assert!(found.next().is_none());
}

#[tokio::test]
async fn test_account_operations_on_sqlite() {
    let ledger = Arc::new(common::setup_ledger().await);
    let mut account = Account::new("1000000000000001", "5000", ledger.clone()).unwrap();

    let deposit = account.deposit("100").await.unwrap();
    let declined = account.withdraw("6000").await.unwrap_err();
    let interest = account.apply_interest().await.unwrap();

    assert_eq!(deposit.sequence_id(), 0);
    assert_eq!(declined.declined_record().unwrap().sequence_id(), 1);
    assert_eq!(interest.sequence_id(), 2);
    assert_eq!(interest.amount(), Money::new(dec!(255)));
    assert_eq!(account.balance(), Money::new(dec!(5355)));

    // Every attempt advanced the persisted counter
    assert_eq!(ledger.next_transaction_id().await.unwrap(), 3);

    let failed: Vec<_> = ledger
        .find_transactions(account.account_number(), "Failed", 7)
        .await
        .unwrap()
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].amount(), Money::ZERO);
}

#[tokio::test]
async fn test_rate_change_reaches_accounts() {
    let ledger = Arc::new(common::setup_ledger().await);
    let mut account = Account::new("1000000000000002", "1000", ledger.clone()).unwrap();

    change_monthly_interest_rate("0.10", ledger.as_ref()).await.unwrap();
    let record = account.apply_interest().await.unwrap();
    assert_eq!(record.amount(), Money::new(dec!(100)));

    assert!(change_monthly_interest_rate("0.41", ledger.as_ref()).await.is_err());
    assert_eq!(ledger.load_monthly_interest_rate().await.unwrap(), dec!(0.10));
}

#[tokio::test]
async fn test_account_snapshot_upsert_keeps_opened_at() {
    let ledger = common::setup_ledger().await;
    let opened_at = Utc::now() - Duration::days(30);

    let mut snapshot = AccountSnapshot {
        account_number: "1000000000000003".to_string(),
        time_zone: "-05:00".to_string(),
        balance: dec!(10.00),
        opened_at,
    };
    ledger.save_account(&snapshot).await.unwrap();

    snapshot.balance = dec!(25.50);
    snapshot.opened_at = Utc::now();
    ledger.save_account(&snapshot).await.unwrap();

    let loaded = ledger.load_account("1000000000000003").await.unwrap().unwrap();
    assert_eq!(loaded.balance, dec!(25.50));
    assert_eq!(loaded.time_zone, "-05:00");
    assert_eq!(loaded.opened_at, opened_at);

    assert!(ledger.load_account("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_id_draws_are_unique() {
    let path = std::env::temp_dir().join(format!("bank_ledger_{}.db", Uuid::new_v4()));
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .unwrap();
    db::ensure_schema(&pool).await.unwrap();

    let ledger = Arc::new(SqliteLedger::new(pool.clone()));
    let mut tasks = Vec::new();
    for _ in 0..8 {
        let ledger = ledger.clone();
        tasks.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..25 {
                ids.push(ledger.next_transaction_id().await.unwrap());
            }
            ids
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        ids.extend(task.await.unwrap());
    }

    let unique: HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(ids.len(), 200);
    assert_eq!(unique.len(), 200);
    assert_eq!(unique, (0..200).collect::<HashSet<u64>>());

    pool.close().await;
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}
