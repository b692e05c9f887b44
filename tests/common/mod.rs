//! Common test utilities

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use bank_ledger::{api, db, SqliteLedger};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Setup test database - a private in-memory SQLite database with the schema
/// applied.
///
/// A single connection that never expires keeps the in-memory database alive
/// for the whole test.
pub async fn setup_test_db() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse database URL");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to connect to DB");

    db::ensure_schema(&pool).await.expect("Failed to create schema");
    pool
}

pub async fn setup_ledger() -> SqliteLedger {
    SqliteLedger::new(setup_test_db().await)
}

pub async fn setup_app() -> axum::Router {
    api::app(api::AppState::new(setup_ledger().await))
}

/// Router plus the pool behind it, for tests that touch storage directly
pub async fn setup_app_with_pool() -> (SqlitePool, axum::Router) {
    let pool = setup_test_db().await;
    let app = api::app(api::AppState::new(SqliteLedger::new(pool.clone())));
    (pool, app)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
