use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::responses::*;
use crate::engine::ScanState;
use crate::host::ConstantProductPool;
use crate::metrics::ScanStats;
use crate::models::{
    Asset, CancelledOrder, Direction, FillRecord, OrderId, PlacedOrder, ReceiptRecord, Redemption,
    ScanOutcome, ScanReport, TradeExecution, VenueId,
};

/// OpenAPI specification
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Take-Profit Engine API",
        version = "1.0.0",
        description = "Pooled take-profit orders on AMM venues, filled as trades move the price across their boundaries",
        license(
            name = "MIT"
        )
    ),
    paths(
        handlers::health_check,
        handlers::register_venue,
        handlers::get_venue,
        handlers::get_positions,
        handlers::trade_completed,
        handlers::place_order,
        handlers::cancel_order,
        handlers::get_order_identity,
        handlers::get_receipt,
        handlers::transfer_receipts,
        handlers::redeem,
        handlers::execute_swap,
        handlers::deposit,
        handlers::get_wallet,
        handlers::get_scan_metrics,
    ),
    components(
        schemas(
            VenueId,
            Asset,
            Direction,
            OrderId,
            ReceiptRecord,
            FillRecord,
            ScanOutcome,
            ScanReport,
            ScanState,
            PlacedOrder,
            CancelledOrder,
            Redemption,
            TradeExecution,
            ConstantProductPool,
            ScanStats,
            RegisterVenueRequest,
            VenueResponse,
            PositionResponse,
            PositionsResponse,
            PlaceOrderRequest,
            CancelOrderRequest,
            OrderIdentityResponse,
            ReceiptResponse,
            ReceiptHolder,
            TransferReceiptsRequest,
            RedeemRequest,
            SwapRequest,
            TradeCompletedRequest,
            DepositRequest,
            WalletBalance,
            WalletResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Venues", description = "Venue registration and trade callbacks"),
        (name = "Orders", description = "Take-profit order placement and cancellation"),
        (name = "Receipts", description = "Receipt supply and redemption"),
        (name = "Trading", description = "Swaps routed through the engine"),
        (name = "Wallets", description = "Simulated custody balances"),
        (name = "Metrics", description = "Fulfillment pass statistics"),
    )
)]
pub struct ApiDoc;
