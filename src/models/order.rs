use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::fill::ScanReport;
use super::order_id::OrderId;
use super::venue::Tick;

/// Result of a successful placement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    /// The normalized boundary the deposit rests at
    pub boundary: Tick,
    pub amount: Decimal,
    /// Outstanding amount at the boundary after this deposit
    pub outstanding: Decimal,
}

/// Result of a successful cancellation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancelledOrder {
    pub order_id: OrderId,
    /// Amount of the original deposit asset returned to the caller
    pub refunded: Decimal,
    pub outstanding: Decimal,
}

/// Result of a successful redemption
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Redemption {
    pub order_id: OrderId,
    pub destination: String,
    /// Receipt units burned
    pub burned: Decimal,
    /// Amount of the acquired asset released
    pub payout: Decimal,
    pub remaining_supply: Decimal,
    pub remaining_claimable: Decimal,
}

/// A trader swap routed through the venue, plus the scan it triggered
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TradeExecution {
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub tick_before: Tick,
    pub tick_after: Tick,
    pub scan: ScanReport,
}
