//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::account::AccountError;
use crate::domain::DomainError;
use crate::ledger::LedgerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    // Account operation errors
    #[error(transparent)]
    Account(#[from] AccountError),

    // Server errors (5xx)
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        Self::Account(AccountError::Domain(err))
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Confirmation number of the persisted Declined record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_number: Option<String>,
}

fn ledger_status(err: &LedgerError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        LedgerError::InvalidQuery(msg) => {
            (StatusCode::BAD_REQUEST, "invalid_query", Some(msg.clone()))
        }
        other => {
            tracing::error!("Storage error: {:?}", other);
            (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut confirmation_number = None;

        let (status, error_code, details) = match &self {
            // 404 Not Found
            AppError::AccountNotFound(number) => {
                (StatusCode::NOT_FOUND, "account_not_found", Some(number.clone()))
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Account(AccountError::Domain(domain_err)) => match domain_err {
                DomainError::Declined { reason, record } => {
                    confirmation_number = Some(record.confirmation_number());
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        "transaction_declined",
                        Some(reason.to_string()),
                    )
                }
                DomainError::InvalidRate(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_rate", Some(msg.clone()))
                }
                DomainError::InvalidBalance(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                }
                DomainError::InvalidTimeZone(zone) => {
                    (StatusCode::BAD_REQUEST, "invalid_time_zone", Some(zone.clone()))
                }
            },

            // 500 Internal Server Error (or 400 for a bad query)
            AppError::Account(AccountError::Ledger(e)) | AppError::Ledger(e) => ledger_status(e),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
            confirmation_number,
        };

        (status, Json(body)).into_response()
    }
}
