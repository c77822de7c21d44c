//! External collaborators of the engine
//!
//! - `exchange` - AMM price observation and swap execution
//! - `ledger` - receipt mint/burn/balance
//! - `custody` - deposit collection and payout release
//!
//! Each concern is a trait with an in-process implementation.

pub mod custody;
pub mod exchange;
pub mod ledger;

pub use custody::{Custody, CustodyError, InMemoryCustody};
pub use exchange::{
    tick_at_price, ConstantProductPool, Exchange, PriceLimit, SimulatedExchange, SwapError,
    MAX_TICK, MIN_TICK,
};
pub use ledger::{InMemoryLedger, Ledger, LedgerError};
