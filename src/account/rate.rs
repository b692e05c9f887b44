//! Monthly interest rate management

use crate::domain::{AmountInput, MonthlyRate};
use crate::ledger::LedgerStore;

use super::AccountError;

/// Validate and persist a new monthly interest rate.
///
/// Accounts read the rate from the ledger on every `apply_interest`, so the
/// change is visible to every account from its next interest run.
///
/// # Errors
/// - `DomainError::InvalidRate` if the input is not a number in `0.00..=0.40`;
///   the ledger is not touched
/// - `LedgerError` if saving fails
pub async fn change_monthly_interest_rate<S>(
    new_rate: impl Into<AmountInput>,
    ledger: &S,
) -> Result<MonthlyRate, AccountError>
where
    S: LedgerStore + ?Sized,
{
    let input = new_rate.into();
    let rate = MonthlyRate::parse(&input).map_err(|e| {
        tracing::warn!(input = %input, error = %e, "Rejected monthly interest rate");
        e
    })?;

    ledger.save_monthly_interest_rate(rate.value()).await?;

    tracing::info!(rate = %rate, "Monthly interest rate changed");
    Ok(rate)
}
