use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::engine::{validate_spacing, SharedEngine, SimulatedEngine, TakeProfitError};
use crate::host::{Exchange, Ledger, PriceLimit};
use crate::metrics::{ScanLatencyTracker, ScanStats};
use crate::models::{
    CancelledOrder, OrderId, PlacedOrder, Redemption, ScanReport, TradeExecution, VenueConfig, VenueId,
};
use crate::websocket::{topics, Broadcaster, WsMessage};

use super::responses::*;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub broadcaster: Broadcaster,
    pub scan_metrics: Arc<Mutex<ScanLatencyTracker>>,
}

impl AppState {
    pub fn new(engine: SimulatedEngine, broadcaster: Broadcaster, scan_metrics: ScanLatencyTracker) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            broadcaster,
            scan_metrics: Arc::new(Mutex::new(scan_metrics)),
        }
    }

    /// `None` records a pass that failed and was reverted
    fn record_scan(&self, report: Option<&ScanReport>, started: Instant) {
        let mut metrics = self.scan_metrics.lock();
        match report {
            Some(report) => metrics.record_pass(report, started.elapsed()),
            None => metrics.record_failure(),
        }
    }
}

/// Convert TakeProfitError to HTTP response
impl IntoResponse for TakeProfitError {
    fn into_response(self) -> Response {
        let status = match &self {
            TakeProfitError::VenueAlreadyRegistered(_) => StatusCode::CONFLICT,
            TakeProfitError::UnknownVenue(_)
            | TakeProfitError::NoOrder(_)
            | TakeProfitError::ReceiptNotFound(_) => StatusCode::NOT_FOUND,
            TakeProfitError::SwapFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            TakeProfitError::Custody(_) => StatusCode::BAD_REQUEST,
            e if e.is_validation_error() || e.is_state_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if self.is_execution_error() {
            warn!(error = %self, status = %status, "Request failed during execution");
        }

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy")
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// Register a venue with the engine
#[utoipa::path(
    post,
    path = "/api/v1/venues",
    tag = "Venues",
    request_body = RegisterVenueRequest,
    responses(
        (status = 201, description = "Venue registered", body = VenueResponse),
        (status = 400, description = "Invalid spacing or reserves", body = ErrorResponse),
        (status = 409, description = "Venue already registered", body = ErrorResponse)
    )
)]
pub async fn register_venue(
    State(state): State<AppState>,
    Json(request): Json<RegisterVenueRequest>,
) -> Result<(StatusCode, Json<VenueResponse>), TakeProfitError> {
    validate_spacing(request.tick_spacing)?;
    let mut engine = state.engine.lock();

    if let (Some(reserve0), Some(reserve1)) = (request.reserve0, request.reserve1) {
        if engine.venue_config(&request.venue).is_ok() {
            return Err(TakeProfitError::VenueAlreadyRegistered(request.venue));
        }
        if engine.exchange().pool(&request.venue).is_none() {
            engine
                .exchange_mut()
                .create_pool(request.venue.clone(), reserve0, reserve1)?;
        }
    }
    engine.register_venue(request.venue.clone(), VenueConfig::new(request.tick_spacing))?;

    Ok((StatusCode::CREATED, Json(venue_response(&engine, &request.venue)?)))
}

/// Venue configuration and live price
#[utoipa::path(
    get,
    path = "/api/v1/venues/{venue}",
    tag = "Venues",
    params(("venue" = String, Path, description = "Venue identifier")),
    responses(
        (status = 200, description = "Venue found", body = VenueResponse),
        (status = 404, description = "Unknown venue", body = ErrorResponse)
    )
)]
pub async fn get_venue(
    State(state): State<AppState>,
    Path(venue): Path<String>,
) -> Result<Json<VenueResponse>, TakeProfitError> {
    let engine = state.engine.lock();
    Ok(Json(venue_response(&engine, &VenueId::new(venue))?))
}

fn venue_response(engine: &SimulatedEngine, venue: &VenueId) -> Result<VenueResponse, TakeProfitError> {
    let config = engine.venue_config(venue)?;
    Ok(VenueResponse {
        venue: venue.clone(),
        tick_spacing: config.tick_spacing,
        current_tick: engine.exchange().current_tick(venue)?,
        last_boundary: engine.last_boundary(venue),
        scan_state: engine.scan_state(venue),
        pool: engine.exchange().pool(venue).cloned(),
    })
}

/// Every boundary that ever held a deposit on a venue
#[utoipa::path(
    get,
    path = "/api/v1/venues/{venue}/positions",
    tag = "Venues",
    params(("venue" = String, Path, description = "Venue identifier")),
    responses(
        (status = 200, description = "Positions", body = PositionsResponse),
        (status = 404, description = "Unknown venue", body = ErrorResponse)
    )
)]
pub async fn get_positions(
    State(state): State<AppState>,
    Path(venue): Path<String>,
) -> Result<Json<PositionsResponse>, TakeProfitError> {
    let venue = VenueId::new(venue);
    let engine = state.engine.lock();
    engine.venue_config(&venue)?;

    let positions = engine
        .positions(&venue)
        .into_iter()
        .map(|(order_id, outstanding)| PositionResponse { order_id, outstanding })
        .collect();

    Ok(Json(PositionsResponse {
        last_boundary: engine.last_boundary(&venue),
        venue,
        positions,
    }))
}

/// Trade-completed callback for trades executed outside this service
#[utoipa::path(
    post,
    path = "/api/v1/venues/{venue}/trade-completed",
    tag = "Venues",
    params(("venue" = String, Path, description = "Venue identifier")),
    request_body = TradeCompletedRequest,
    responses(
        (status = 200, description = "Fulfillment pass report", body = ScanReport),
        (status = 404, description = "Unknown venue", body = ErrorResponse),
        (status = 422, description = "A fill swap failed; nothing was changed", body = ErrorResponse)
    )
)]
pub async fn trade_completed(
    State(state): State<AppState>,
    Path(venue): Path<String>,
    Json(request): Json<TradeCompletedRequest>,
) -> Result<Json<ScanReport>, TakeProfitError> {
    let venue = VenueId::new(venue);
    let started = Instant::now();
    let result = state.engine.lock().after_trade(&venue, request.trade_direction);
    state.record_scan(result.as_ref().ok(), started);

    let report = result?;
    state.broadcaster.publish_scan(&report);
    Ok(Json(report))
}

/// Place a take-profit order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = PlacedOrder),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorResponse),
        (status = 404, description = "Unknown venue", body = ErrorResponse)
    )
)]
pub async fn place_order(
    State(state): State<AppState>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>), TakeProfitError> {
    let placed = state.engine.lock().place_order(
        &request.owner,
        &request.venue,
        request.target_tick,
        request.direction,
        request.amount,
    )?;

    state
        .broadcaster
        .broadcast(&topics::orders(&request.venue), WsMessage::placed(&placed));
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Cancel the caller's holding at a target
#[utoipa::path(
    post,
    path = "/api/v1/orders/cancel",
    tag = "Orders",
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled and deposit refunded", body = CancelledOrder),
        (status = 400, description = "Pooled remainder smaller than the holding", body = ErrorResponse),
        (status = 404, description = "No holding for this order", body = ErrorResponse)
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Json(request): Json<CancelOrderRequest>,
) -> Result<Json<CancelledOrder>, TakeProfitError> {
    let cancelled = state.engine.lock().cancel_order(
        &request.owner,
        &request.venue,
        request.target_tick,
        request.direction,
    )?;

    state
        .broadcaster
        .broadcast(&topics::orders(&request.venue), WsMessage::cancelled(&cancelled));
    Ok(Json(cancelled))
}

/// Resolve the identity a (venue, tick, direction) triple maps to
#[utoipa::path(
    get,
    path = "/api/v1/orders/identity",
    tag = "Orders",
    params(OrderIdentityQuery),
    responses(
        (status = 200, description = "Order identity", body = OrderIdentityResponse),
        (status = 404, description = "Unknown venue", body = ErrorResponse)
    )
)]
pub async fn get_order_identity(
    State(state): State<AppState>,
    Query(query): Query<OrderIdentityQuery>,
) -> Result<Json<OrderIdentityResponse>, TakeProfitError> {
    let order_id = resolve_identity(&state.engine.lock(), &query)?;
    Ok(Json(OrderIdentityResponse {
        key: order_id.to_string(),
        order_id,
    }))
}

fn resolve_identity(engine: &SimulatedEngine, query: &OrderIdentityQuery) -> Result<OrderId, TakeProfitError> {
    engine.order_id_for(&VenueId::new(query.venue.as_str()), query.tick, query.direction)
}

/// Receipt supply and claimable proceeds of an order identity
#[utoipa::path(
    get,
    path = "/api/v1/receipts",
    tag = "Receipts",
    params(OrderIdentityQuery),
    responses(
        (status = 200, description = "Receipt record", body = ReceiptResponse),
        (status = 404, description = "No deposit was ever made for this identity", body = ErrorResponse)
    )
)]
pub async fn get_receipt(
    State(state): State<AppState>,
    Query(query): Query<OrderIdentityQuery>,
) -> Result<Json<ReceiptResponse>, TakeProfitError> {
    let engine = state.engine.lock();
    let order_id = resolve_identity(&engine, &query)?;
    let record = engine
        .receipt(&order_id)
        .cloned()
        .ok_or_else(|| TakeProfitError::ReceiptNotFound(order_id.clone()))?;

    let holding = query
        .owner
        .as_deref()
        .map(|owner| engine.ledger().balance_of(owner, &order_id));
    let redeemable = match holding {
        Some(units) if !units.is_zero() => Some(engine.preview_redeem(&order_id, units)?),
        Some(_) => Some(Decimal::ZERO),
        None => None,
    };

    let holders = engine
        .holders(&order_id)
        .into_iter()
        .map(|(owner, balance)| ReceiptHolder { owner, balance })
        .collect();

    Ok(Json(ReceiptResponse {
        outstanding: engine.outstanding(&order_id),
        record,
        holding,
        redeemable,
        holders,
    }))
}

/// Redeem receipts for their share of filled proceeds
#[utoipa::path(
    post,
    path = "/api/v1/redemptions",
    tag = "Receipts",
    request_body = RedeemRequest,
    responses(
        (status = 200, description = "Receipts burned and payout released", body = Redemption),
        (status = 400, description = "Amount exceeds holding", body = ErrorResponse),
        (status = 404, description = "Unknown order identity", body = ErrorResponse)
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<Redemption>, TakeProfitError> {
    let order_id = OrderId::new(request.venue.clone(), request.boundary, request.direction);
    let destination = request.destination.as_deref().unwrap_or(&request.owner);
    let redemption = state
        .engine
        .lock()
        .redeem(&request.owner, &order_id, request.amount, destination)?;

    state
        .broadcaster
        .broadcast(&topics::redemptions(&request.venue), WsMessage::redeemed(&redemption));
    Ok(Json(redemption))
}

/// Transfer receipts to another holder
#[utoipa::path(
    post,
    path = "/api/v1/receipts/transfer",
    tag = "Receipts",
    request_body = TransferReceiptsRequest,
    responses(
        (status = 200, description = "Receipts moved", body = ReceiptResponse),
        (status = 400, description = "Amount exceeds the sender's holding", body = ErrorResponse),
        (status = 404, description = "Unknown order identity", body = ErrorResponse)
    )
)]
pub async fn transfer_receipts(
    State(state): State<AppState>,
    Json(request): Json<TransferReceiptsRequest>,
) -> Result<Json<ReceiptResponse>, TakeProfitError> {
    let order_id = OrderId::new(request.venue, request.boundary, request.direction);
    let mut engine = state.engine.lock();
    engine.transfer_receipts(&request.from, &request.to, &order_id, request.amount)?;

    let record = engine
        .receipt(&order_id)
        .cloned()
        .ok_or_else(|| TakeProfitError::ReceiptNotFound(order_id.clone()))?;
    let holding = engine.ledger().balance_of(&request.to, &order_id);
    let holders = engine
        .holders(&order_id)
        .into_iter()
        .map(|(owner, balance)| ReceiptHolder { owner, balance })
        .collect();

    Ok(Json(ReceiptResponse {
        outstanding: engine.outstanding(&order_id),
        redeemable: Some(engine.preview_redeem(&order_id, holding)?),
        holding: Some(holding),
        record,
        holders,
    }))
}

/// Execute a market swap; crossed take-profit orders fill before it returns
#[utoipa::path(
    post,
    path = "/api/v1/swaps",
    tag = "Trading",
    request_body = SwapRequest,
    responses(
        (status = 200, description = "Swap executed", body = TradeExecution),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorResponse),
        (status = 422, description = "Swap rejected by the venue", body = ErrorResponse)
    )
)]
pub async fn execute_swap(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<TradeExecution>, TakeProfitError> {
    let limit = request
        .limit_tick
        .map(PriceLimit::Tick)
        .unwrap_or(PriceLimit::Unbounded);

    let started = Instant::now();
    let result = state.engine.lock().execute_swap(
        &request.trader,
        &request.venue,
        request.direction,
        request.amount_in,
        limit,
    );
    state.record_scan(result.as_ref().ok().map(|trade| &trade.scan), started);

    let trade = result?;
    debug!(venue = %request.venue, fills = trade.scan.fills.len(), "Broadcasting swap");
    state.broadcaster.broadcast(
        &topics::swaps(&request.venue),
        WsMessage::swap(&request.venue, request.direction, &trade),
    );
    state.broadcaster.publish_scan(&trade.scan);
    Ok(Json(trade))
}

/// Credit a wallet
#[utoipa::path(
    post,
    path = "/api/v1/wallets/deposit",
    tag = "Wallets",
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Wallet credited", body = WalletResponse),
        (status = 400, description = "Invalid amount", body = ErrorResponse)
    )
)]
pub async fn deposit(
    State(state): State<AppState>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<WalletResponse>, TakeProfitError> {
    let mut engine = state.engine.lock();
    engine
        .custody_mut()
        .deposit(&request.owner, &request.venue, request.asset, request.amount)?;
    Ok(Json(wallet_response(&engine, &request.owner)))
}

/// All balances of one owner
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{owner}",
    tag = "Wallets",
    params(("owner" = String, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Wallet balances", body = WalletResponse)
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Json<WalletResponse> {
    let engine = state.engine.lock();
    Json(wallet_response(&engine, &owner))
}

fn wallet_response(engine: &SimulatedEngine, owner: &str) -> WalletResponse {
    let balances = engine
        .custody()
        .wallet_of(owner)
        .into_iter()
        .map(|(venue, asset, balance)| WalletBalance { venue, asset, balance })
        .collect();
    WalletResponse {
        owner: owner.to_string(),
        balances,
    }
}

/// Fulfillment pass statistics
#[utoipa::path(
    get,
    path = "/api/v1/metrics/scan",
    tag = "Metrics",
    responses(
        (status = 200, description = "Scan pass statistics", body = ScanStats)
    )
)]
pub async fn get_scan_metrics(State(state): State<AppState>) -> Json<ScanStats> {
    Json(state.scan_metrics.lock().stats())
}
