pub mod fill;
pub mod order;
pub mod order_id;
pub mod receipt;
pub mod venue;

pub use fill::{FillRecord, ScanOutcome, ScanReport};
pub use order::{CancelledOrder, PlacedOrder, Redemption, TradeExecution};
pub use order_id::OrderId;
pub use receipt::ReceiptRecord;
pub use venue::{normalize_tick, Asset, Direction, Tick, VenueConfig, VenueId};
