use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::engine::ScanState;
use crate::host::ConstantProductPool;
use crate::models::{Asset, Direction, OrderId, ReceiptRecord, Tick, VenueId};

/// Request to register a venue, optionally creating its pool
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterVenueRequest {
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    #[schema(example = 10)]
    pub tick_spacing: Tick,
    /// Token0 liquidity for a new simulated pool
    #[schema(value_type = Option<String>, example = "1000000")]
    pub reserve0: Option<Decimal>,
    /// Token1 liquidity for a new simulated pool
    #[schema(value_type = Option<String>, example = "1000000")]
    pub reserve1: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VenueResponse {
    #[schema(value_type = String)]
    pub venue: VenueId,
    pub tick_spacing: Tick,
    pub current_tick: Tick,
    pub last_boundary: Option<Tick>,
    pub scan_state: ScanState,
    pub pool: Option<ConstantProductPool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PositionResponse {
    pub order_id: OrderId,
    #[schema(value_type = String, example = "50")]
    pub outstanding: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PositionsResponse {
    #[schema(value_type = String)]
    pub venue: VenueId,
    pub last_boundary: Option<Tick>,
    pub positions: Vec<PositionResponse>,
}

/// Request to place a take-profit order
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub owner: String,
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    /// Raw target tick; normalized down to the venue's spacing
    #[schema(example = 105)]
    pub target_tick: Tick,
    pub direction: Direction,
    #[schema(value_type = String, example = "50")]
    pub amount: Decimal,
}

/// Request to cancel the caller's whole holding at a target
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelOrderRequest {
    pub owner: String,
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    pub target_tick: Tick,
    pub direction: Direction,
}

/// Query identifying a (venue, tick, direction) triple
#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderIdentityQuery {
    pub venue: String,
    pub tick: Tick,
    pub direction: Direction,
    /// Include this owner's holding in a receipt lookup
    pub owner: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderIdentityResponse {
    pub order_id: OrderId,
    /// Flat string form of the identity
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiptResponse {
    pub record: ReceiptRecord,
    #[schema(value_type = String)]
    pub outstanding: Decimal,
    /// Receipts held by the queried owner
    #[schema(value_type = Option<String>)]
    pub holding: Option<Decimal>,
    /// What that holding would redeem for right now
    #[schema(value_type = Option<String>)]
    pub redeemable: Option<Decimal>,
    pub holders: Vec<ReceiptHolder>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReceiptHolder {
    pub owner: String,
    #[schema(value_type = String)]
    pub balance: Decimal,
}

/// Move receipts of one order identity to another holder
#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferReceiptsRequest {
    pub from: String,
    pub to: String,
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    /// Normalized boundary of the order identity
    pub boundary: Tick,
    pub direction: Direction,
    #[schema(value_type = String, example = "25")]
    pub amount: Decimal,
}

/// Request to redeem receipts for filled proceeds
#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemRequest {
    pub owner: String,
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    /// Normalized boundary of the order identity
    pub boundary: Tick,
    pub direction: Direction,
    #[schema(value_type = String, example = "40")]
    pub amount: Decimal,
    /// Payout recipient, defaults to the owner
    pub destination: Option<String>,
}

/// Trader swap routed through the venue
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapRequest {
    pub trader: String,
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    pub direction: Direction,
    #[schema(value_type = String, example = "1000")]
    pub amount_in: Decimal,
    /// Reject the swap if it would move the venue past this tick
    pub limit_tick: Option<Tick>,
}

/// Host notification that a trade completed on a venue
#[derive(Debug, Deserialize, ToSchema)]
pub struct TradeCompletedRequest {
    pub trade_direction: Direction,
}

/// Credit a wallet from outside the system
#[derive(Debug, Deserialize, ToSchema)]
pub struct DepositRequest {
    pub owner: String,
    #[schema(value_type = String, example = "ETH-USDC")]
    pub venue: VenueId,
    pub asset: Asset,
    #[schema(value_type = String, example = "1000")]
    pub amount: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletBalance {
    #[schema(value_type = String)]
    pub venue: VenueId,
    pub asset: Asset,
    #[schema(value_type = String)]
    pub balance: Decimal,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub owner: String,
    pub balances: Vec<WalletBalance>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
