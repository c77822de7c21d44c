//! Take-Profit Engine Module
//!
//! This module contains the take-profit order engine:
//! - `errors` - Error types for engine operations
//! - `validation` - Input validation
//! - `order_book` - Outstanding positions per (venue, boundary, direction)
//! - `receipts` - Receipt supply and claimable proceeds per order identity
//! - `tick_tracker` - Last boundary observed per venue
//! - `journal` - Undo journal backing all-or-nothing calls
//! - `scanner` - Crossing detection and sequential fills after each trade
//! - `take_profit` - The engine facade

pub mod errors;
mod journal;
pub mod order_book;
pub mod receipts;
pub mod scanner;
pub mod take_profit;
pub mod tick_tracker;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types for convenience
pub use errors::TakeProfitError;
pub use order_book::{Movement, OrderBook};
pub use receipts::ReceiptAccounting;
pub use scanner::ScanState;
pub use take_profit::{SharedEngine, SimulatedEngine, TakeProfitEngine};
pub use tick_tracker::TickTracker;
pub use validation::{validate_amount, validate_spacing, validate_tick};
