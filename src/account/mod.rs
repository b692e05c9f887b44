//! Account module
//!
//! The transaction engine: account operations, rate management and account
//! identity helpers.

pub mod engine;
mod error;
pub mod number;
pub mod rate;

pub use engine::Account;
pub use error::AccountError;
pub use number::{format_time_zone, generate_account_number, parse_time_zone};
pub use rate::change_monthly_interest_rate;
