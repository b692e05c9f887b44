//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::{change_monthly_interest_rate, format_time_zone};
use crate::domain::{AmountInput, ConfirmationRecord, Money, OperationContext, TransactionType};
use crate::error::AppResult;
use crate::ledger::LedgerStore;

use super::state::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    #[serde(default)]
    pub balance: AmountInput,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub account_number: String,
    pub balance: Money,
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    #[serde(default)]
    pub amount: AmountInput,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub confirmation_number: String,
    pub transaction_type: TransactionType,
    pub account_number: String,
    pub sequence_id: u64,
    pub amount: Money,
    pub timestamp_utc: DateTime<Utc>,
    /// Timestamp in the account's time zone
    pub local_time: String,
    /// Balance after the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Money>,
}

impl ConfirmationResponse {
    fn new(record: &ConfirmationRecord, time_zone: &FixedOffset) -> Self {
        Self {
            confirmation_number: record.confirmation_number(),
            transaction_type: record.transaction_type(),
            account_number: record.account_number().to_string(),
            sequence_id: record.sequence_id(),
            amount: record.amount(),
            timestamp_utc: record.timestamp_utc(),
            local_time: record.local_time(time_zone),
            balance: None,
        }
    }

    fn with_balance(mut self, balance: Money) -> Self {
        self.balance = Some(balance);
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(rename = "type", default = "default_type")]
    pub transaction_type: String,
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_type() -> String {
    "All".to_string()
}

fn default_days() -> u32 {
    30
}

#[derive(Debug, Serialize)]
pub struct TransactionsResponse {
    pub account_number: String,
    pub transaction_type: String,
    pub days: u32,
    pub transactions: Vec<ConfirmationResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    #[serde(default)]
    pub rate: AmountInput,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub rate: Decimal,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(open_account))
        .route("/accounts/:account_number", get(get_account))
        .route("/accounts/:account_number/deposit", post(deposit))
        .route("/accounts/:account_number/withdraw", post(withdraw))
        .route("/accounts/:account_number/interest", post(apply_interest))
        .route("/accounts/:account_number/transactions", get(get_transactions))
        .route(
            "/interest-rate",
            get(get_interest_rate).put(change_interest_rate),
        )
}

// =========================================================================
// POST /accounts
// =========================================================================

/// Open a new account
async fn open_account(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<OpenAccountRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let shared = state
        .open_account(request.balance, request.time_zone.as_deref())
        .await?;
    let account = shared.lock().await;

    tracing::debug!(
        correlation_id = ?context.correlation_id,
        account_number = %account.account_number(),
        "Open account request served"
    );

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            account_number: account.account_number().to_string(),
            balance: account.balance(),
            time_zone: format_time_zone(account.time_zone()),
        }),
    ))
}

// =========================================================================
// GET /accounts/:account_number
// =========================================================================

async fn get_account(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let shared = state.account(&account_number).await?;
    let account = shared.lock().await;

    Ok(Json(AccountResponse {
        account_number: account.account_number().to_string(),
        balance: account.balance(),
        time_zone: format_time_zone(account.time_zone()),
    }))
}

// =========================================================================
// POST /accounts/:account_number/deposit
// =========================================================================

async fn deposit(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_number): Path<String>,
    Json(request): Json<AmountRequest>,
) -> AppResult<(StatusCode, Json<ConfirmationResponse>)> {
    let shared = state.account(&account_number).await?;
    let mut account = shared.lock().await;

    tracing::debug!(
        correlation_id = ?context.correlation_id,
        amount = %request.amount,
        "Deposit requested"
    );

    let record = account.deposit(request.amount).await?;
    state.persist(&account).await;

    Ok((
        StatusCode::CREATED,
        Json(ConfirmationResponse::new(&record, account.time_zone()).with_balance(account.balance())),
    ))
}

// =========================================================================
// POST /accounts/:account_number/withdraw
// =========================================================================

async fn withdraw(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(account_number): Path<String>,
    Json(request): Json<AmountRequest>,
) -> AppResult<(StatusCode, Json<ConfirmationResponse>)> {
    let shared = state.account(&account_number).await?;
    let mut account = shared.lock().await;

    tracing::debug!(
        correlation_id = ?context.correlation_id,
        amount = %request.amount,
        "Withdrawal requested"
    );

    let record = account.withdraw(request.amount).await?;
    state.persist(&account).await;

    Ok((
        StatusCode::CREATED,
        Json(ConfirmationResponse::new(&record, account.time_zone()).with_balance(account.balance())),
    ))
}

// =========================================================================
// POST /accounts/:account_number/interest
// =========================================================================

async fn apply_interest(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
) -> AppResult<(StatusCode, Json<ConfirmationResponse>)> {
    let shared = state.account(&account_number).await?;
    let mut account = shared.lock().await;

    let record = account.apply_interest().await?;
    state.persist(&account).await;

    Ok((
        StatusCode::CREATED,
        Json(ConfirmationResponse::new(&record, account.time_zone()).with_balance(account.balance())),
    ))
}

// =========================================================================
// GET /accounts/:account_number/transactions
// =========================================================================

async fn get_transactions(
    State(state): State<AppState>,
    Path(account_number): Path<String>,
    Query(query): Query<TransactionsQuery>,
) -> AppResult<Json<TransactionsResponse>> {
    let shared = state.account(&account_number).await?;
    let time_zone = *shared.lock().await.time_zone();

    let transactions = state
        .ledger()
        .find_transactions(&account_number, &query.transaction_type, query.days)
        .await?
        .map(|record| ConfirmationResponse::new(&record, &time_zone))
        .collect();

    Ok(Json(TransactionsResponse {
        account_number,
        transaction_type: query.transaction_type,
        days: query.days,
        transactions,
    }))
}

// =========================================================================
// GET/PUT /interest-rate
// =========================================================================

async fn get_interest_rate(State(state): State<AppState>) -> AppResult<Json<RateResponse>> {
    let rate = state.ledger().load_monthly_interest_rate().await?;
    Ok(Json(RateResponse { rate }))
}

async fn change_interest_rate(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<RateResponse>> {
    tracing::debug!(
        correlation_id = ?context.correlation_id,
        rate = %request.rate,
        "Rate change requested"
    );

    let rate = change_monthly_interest_rate(request.rate, state.ledger().as_ref()).await?;
    Ok(Json(RateResponse { rate: rate.value() }))
}
