//! Error types for take-profit operations
//!
//! Every fallible engine operation returns `TakeProfitError`. Failures raised
//! by the external collaborators keep their own types and are wrapped here
//! without losing detail.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::host::{CustodyError, LedgerError, SwapError, MAX_TICK, MIN_TICK};
use crate::models::{OrderId, Tick, VenueId};

/// Errors that can occur during take-profit operations
///
/// # Error Categories
///
/// - **Validation Errors**: `InvalidAmount`, `InvalidSpacing`, `InvalidTick`
/// - **State Errors**: `UnknownVenue`, `VenueAlreadyRegistered`, `NoOrder`,
///   `InsufficientBalance`, `InsufficientOutstanding`, `ReceiptNotFound`
/// - **Execution Errors**: `SwapFailed`, `Ledger`, `Custody`, `ArithmeticOverflow`
/// - **Reported only**: `ScanBudgetExceeded` never fails the triggering call;
///   it is logged and surfaced through the scan report
#[derive(Debug, Error)]
pub enum TakeProfitError {
    /// Deposit or redemption amount was zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// Tick spacing must be strictly positive
    #[error("Invalid tick spacing: {0}")]
    InvalidSpacing(Tick),

    /// Target tick outside the range a venue can ever report
    #[error("Tick {0} outside [{min}, {max}]", min = MIN_TICK, max = MAX_TICK)]
    InvalidTick(Tick),

    #[error("Unknown venue: {0}")]
    UnknownVenue(VenueId),

    #[error("Venue already registered: {0}")]
    VenueAlreadyRegistered(VenueId),

    /// Cancel requested by an owner holding no receipts for the identity
    #[error("No order held for {0}")]
    NoOrder(OrderId),

    /// Redemption exceeds the caller's receipt holding
    #[error("Insufficient receipt balance for {order_id}: held {held}, requested {requested}")]
    InsufficientBalance {
        order_id: OrderId,
        held: Decimal,
        requested: Decimal,
    },

    /// Cancelling would drive the pooled position below zero
    #[error("Insufficient outstanding amount for {order_id}: outstanding {outstanding}, requested {requested}")]
    InsufficientOutstanding {
        order_id: OrderId,
        outstanding: Decimal,
        requested: Decimal,
    },

    #[error("Receipt record not found: {0}")]
    ReceiptNotFound(OrderId),

    /// The exchange rejected a swap; passed through untouched
    #[error(transparent)]
    SwapFailed(#[from] SwapError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Custody error: {0}")]
    Custody(#[from] CustodyError),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    /// A fulfillment pass hit its fill cap before draining every crossing
    #[error("Scan budget exceeded on {venue} after {drained} fills; resuming from boundary {resume_from}")]
    ScanBudgetExceeded {
        venue: VenueId,
        drained: usize,
        resume_from: Tick,
    },
}

impl TakeProfitError {
    /// Returns true if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            TakeProfitError::InvalidAmount(_)
                | TakeProfitError::InvalidSpacing(_)
                | TakeProfitError::InvalidTick(_)
        )
    }

    /// Returns true if this is a state error (missing venue, order or balance)
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            TakeProfitError::UnknownVenue(_)
                | TakeProfitError::VenueAlreadyRegistered(_)
                | TakeProfitError::NoOrder(_)
                | TakeProfitError::InsufficientBalance { .. }
                | TakeProfitError::InsufficientOutstanding { .. }
                | TakeProfitError::ReceiptNotFound(_)
        )
    }

    /// Returns true if a collaborator or the arithmetic failed mid-operation
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self,
            TakeProfitError::SwapFailed(_)
                | TakeProfitError::Ledger(_)
                | TakeProfitError::Custody(_)
                | TakeProfitError::ArithmeticOverflow
        )
    }
}
