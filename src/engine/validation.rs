//! Input validation
//!
//! Checks run before an operation touches any state, so a rejected request
//! never needs rolling back.

use rust_decimal::Decimal;

use crate::host::{MAX_TICK, MIN_TICK};
use crate::models::Tick;

use super::errors::TakeProfitError;

/// Validate that a deposit, redemption or swap amount is positive
///
/// # Example
/// ```ignore
/// use rust_decimal_macros::dec;
/// assert!(validate_amount(dec!(100)).is_ok());
/// assert!(validate_amount(dec!(0)).is_err());
/// ```
pub fn validate_amount(amount: Decimal) -> Result<(), TakeProfitError> {
    if amount <= Decimal::ZERO {
        return Err(TakeProfitError::InvalidAmount(amount));
    }
    Ok(())
}

/// Validate a venue's tick spacing
pub fn validate_spacing(spacing: Tick) -> Result<(), TakeProfitError> {
    if spacing <= 0 {
        return Err(TakeProfitError::InvalidSpacing(spacing));
    }
    Ok(())
}

/// Validate that a target tick lies within the venue tick range
pub fn validate_tick(tick: Tick) -> Result<(), TakeProfitError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(TakeProfitError::InvalidTick(tick));
    }
    Ok(())
}
