//! Account snapshots
//!
//! The service shell keeps one row per opened account so a restarted process
//! can resume the session: identity, time zone and last committed balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::sqlite::{decode_timestamp, encode_timestamp, SqliteLedger};
use super::LedgerError;

/// Persisted view of one account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub account_number: String,
    /// Offset text as accepted by `account::parse_time_zone`
    pub time_zone: String,
    pub balance: Decimal,
    pub opened_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    account_number: String,
    time_zone: String,
    balance: String,
    opened_at: String,
}

impl TryFrom<AccountRow> for AccountSnapshot {
    type Error = LedgerError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let balance = Decimal::from_str(&row.balance).map_err(|e| {
            LedgerError::CorruptRow(format!(
                "account {}: balance {:?}: {}",
                row.account_number, row.balance, e
            ))
        })?;

        Ok(Self {
            opened_at: decode_timestamp(&row.opened_at)?,
            account_number: row.account_number,
            time_zone: row.time_zone,
            balance,
        })
    }
}

impl SqliteLedger {
    /// Insert or refresh an account row. `opened_at` is only written on the
    /// first save.
    pub async fn save_account(&self, snapshot: &AccountSnapshot) -> Result<(), LedgerError> {
        let now = encode_timestamp(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO accounts (account_number, time_zone, balance, opened_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(account_number) DO UPDATE
            SET time_zone = excluded.time_zone,
                balance = excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&snapshot.account_number)
        .bind(&snapshot.time_zone)
        .bind(snapshot.balance.to_string())
        .bind(encode_timestamp(snapshot.opened_at))
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn load_account(
        &self,
        account_number: &str,
    ) -> Result<Option<AccountSnapshot>, LedgerError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT account_number, time_zone, balance, opened_at
            FROM accounts
            WHERE account_number = ?
            "#,
        )
        .bind(account_number)
        .fetch_optional(self.pool())
        .await?;

        row.map(AccountSnapshot::try_from).transpose()
    }
}
