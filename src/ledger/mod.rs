//! Ledger module
//!
//! Persistence boundary for accounts: the transaction-id counter, the
//! monthly interest rate and the append-only confirmation log.

mod accounts;
mod error;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use accounts::AccountSnapshot;
pub use error::LedgerError;
pub use memory::{FailPoint, InMemoryLedger};
pub use sqlite::SqliteLedger;
pub use store::{LedgerStore, QueryWindow, TransactionCursor, TransactionFilter};
