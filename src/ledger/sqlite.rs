//! SQLite Ledger Store
//!
//! Durable implementation of the ledger contract.
//!
//! - `metadata` holds the transaction-id counter and the monthly rate as TEXT
//! - `transactions` is the append-only log, one row per attempt
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that
//! lexicographic order equals chronological order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::domain::{ConfirmationRecord, Money, TransactionType, DEFAULT_MONTHLY_RATE};

use super::store::{LedgerStore, QueryWindow, TransactionCursor, TransactionFilter};
use super::LedgerError;

const TRANSACTION_ID_KEY: &str = "transaction_id";
const MONTHLY_RATE_KEY: &str = "monthly_interest_rate";

/// Row of the `transactions` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub id: i64,
    pub account_number: String,
    #[sqlx(rename = "type")]
    pub transaction_type: String,
    pub created_at: String,
    pub amount: String, // Decimal stored as TEXT
}

impl TryFrom<TransactionRow> for ConfirmationRecord {
    type Error = LedgerError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let sequence_id = u64::try_from(row.id)
            .map_err(|_| LedgerError::CorruptRow(format!("negative transaction id {}", row.id)))?;

        let transaction_type = TransactionType::from_code(&row.transaction_type).ok_or_else(|| {
            LedgerError::CorruptRow(format!(
                "transaction {}: unknown type {:?}",
                row.id, row.transaction_type
            ))
        })?;

        let amount = Money::from_str(&row.amount).map_err(|e| {
            LedgerError::CorruptRow(format!("transaction {}: amount {:?}: {}", row.id, row.amount, e))
        })?;

        let timestamp = decode_timestamp(&row.created_at)?;

        Ok(ConfirmationRecord::from_parts(
            transaction_type,
            row.account_number,
            timestamp,
            sequence_id,
            amount,
        ))
    }
}

pub(crate) fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| LedgerError::CorruptRow(format!("timestamp {:?}: {}", raw, e)))
}

fn type_clause(filter: TransactionFilter) -> &'static str {
    match filter {
        TransactionFilter::All => "",
        TransactionFilter::In => " AND type IN ('D', 'I')",
        TransactionFilter::Out => " AND type = 'W'",
        TransactionFilter::Failed => " AND type = 'X'",
    }
}

/// Ledger Store backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
    default_rate: Decimal,
}

impl SqliteLedger {
    /// Create a ledger over an existing pool. The schema must already exist
    /// (see `db::ensure_schema`).
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            default_rate: DEFAULT_MONTHLY_RATE,
        }
    }

    /// Rate saved on first use when none is stored yet
    pub fn with_default_rate(mut self, rate: Decimal) -> Self {
        self.default_rate = rate;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Id the next draw will return, without consuming it
    pub async fn current_transaction_id(&self) -> Result<u64, LedgerError> {
        let stored: Option<i64> =
            sqlx::query_scalar("SELECT CAST(value AS INTEGER) FROM metadata WHERE key = ?")
                .bind(TRANSACTION_ID_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let current = stored.unwrap_or(0);
        u64::try_from(current)
            .map_err(|_| LedgerError::CorruptRow(format!("negative transaction id {}", current)))
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn next_transaction_id(&self) -> Result<u64, LedgerError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO metadata (key, value) VALUES (?, '0')")
            .bind(TRANSACTION_ID_KEY)
            .execute(&mut *tx)
            .await?;

        // Increment and read back in one statement
        let drawn: i64 = sqlx::query_scalar(
            r#"
            UPDATE metadata
            SET value = CAST(CAST(value AS INTEGER) + 1 AS TEXT)
            WHERE key = ?
            RETURNING CAST(value AS INTEGER) - 1
            "#,
        )
        .bind(TRANSACTION_ID_KEY)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        u64::try_from(drawn)
            .map_err(|_| LedgerError::CorruptRow(format!("negative transaction id {}", drawn)))
    }

    async fn save_transaction_id(&self, next_id: u64) -> Result<(), LedgerError> {
        i64::try_from(next_id).map_err(|_| LedgerError::SequenceOverflow(next_id))?;

        sqlx::query(
            r#"
            INSERT INTO metadata (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE
            SET value = CAST(MAX(CAST(value AS INTEGER), CAST(excluded.value AS INTEGER)) AS TEXT)
            "#,
        )
        .bind(TRANSACTION_ID_KEY)
        .bind(next_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_monthly_interest_rate(&self) -> Result<Decimal, LedgerError> {
        sqlx::query("INSERT OR IGNORE INTO metadata (key, value) VALUES (?, ?)")
            .bind(MONTHLY_RATE_KEY)
            .bind(self.default_rate.to_string())
            .execute(&self.pool)
            .await?;

        let raw: String = sqlx::query_scalar("SELECT value FROM metadata WHERE key = ?")
            .bind(MONTHLY_RATE_KEY)
            .fetch_one(&self.pool)
            .await?;

        Decimal::from_str(&raw)
            .map_err(|e| LedgerError::CorruptRow(format!("monthly rate {:?}: {}", raw, e)))
    }

    async fn save_monthly_interest_rate(&self, rate: Decimal) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO metadata (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(MONTHLY_RATE_KEY)
        .bind(rate.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn add_transaction(&self, record: &ConfirmationRecord) -> Result<(), LedgerError> {
        let id = i64::try_from(record.sequence_id())
            .map_err(|_| LedgerError::SequenceOverflow(record.sequence_id()))?;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_number, type, created_at, amount)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(record.account_number())
        .bind(record.transaction_type().code())
        .bind(encode_timestamp(record.timestamp_utc()))
        .bind(record.amount().to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_transactions_by_type(
        &self,
        account_number: &str,
        filter: TransactionFilter,
        window: QueryWindow,
    ) -> Result<TransactionCursor, LedgerError> {
        let (start, end) = window.bounds(Utc::now());

        let sql = format!(
            r#"
            SELECT id, account_number, type, created_at, amount
            FROM transactions
            WHERE account_number = ?{}
              AND created_at BETWEEN ? AND ?
            ORDER BY created_at DESC, id DESC
            "#,
            type_clause(filter)
        );

        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(account_number)
            .bind(encode_timestamp(start))
            .bind(encode_timestamp(end))
            .fetch_all(&self.pool)
            .await?;

        let records = rows
            .into_iter()
            .map(ConfirmationRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            account_number,
            filter = %filter,
            window_days = window.days(),
            count = records.len(),
            "Ledger query"
        );

        Ok(TransactionCursor::new(records))
    }
}
