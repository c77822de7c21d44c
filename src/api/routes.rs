use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::websocket::{websocket_handler, WsState};

use super::handlers::*;
use super::openapi::ApiDoc;

/// Create the API router with Swagger UI and WebSocket support
pub fn create_router(state: AppState) -> Router {
    let ws_state = Arc::new(WsState {
        broadcaster: state.broadcaster.clone(),
        engine: state.engine.clone(),
    });

    let ws_router = Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(ws_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_check))
        // Venue endpoints
        .route("/api/v1/venues", post(register_venue))
        .route("/api/v1/venues/:venue", get(get_venue))
        .route("/api/v1/venues/:venue/positions", get(get_positions))
        .route("/api/v1/venues/:venue/trade-completed", post(trade_completed))
        // Order endpoints
        .route("/api/v1/orders", post(place_order))
        .route("/api/v1/orders/cancel", post(cancel_order))
        .route("/api/v1/orders/identity", get(get_order_identity))
        // Receipt endpoints
        .route("/api/v1/receipts", get(get_receipt))
        .route("/api/v1/receipts/transfer", post(transfer_receipts))
        .route("/api/v1/redemptions", post(redeem))
        // Trading and wallets
        .route("/api/v1/swaps", post(execute_swap))
        .route("/api/v1/wallets/deposit", post(deposit))
        .route("/api/v1/wallets/:owner", get(get_wallet))
        .route("/api/v1/metrics/scan", get(get_scan_metrics))
        .with_state(state)
        .merge(ws_router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::SimulatedEngine;
    use crate::metrics::ScanLatencyTracker;
    use crate::websocket::Broadcaster;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(
            SimulatedEngine::simulated(EngineConfig::default()),
            Broadcaster::new(),
            ScanLatencyTracker::new().unwrap(),
        );
        create_router(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn app_with_pool() -> Router {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/venues",
            Some(json!({
                "venue": "ETH-USDC",
                "tick_spacing": 10,
                "reserve0": "1000000",
                "reserve1": "1000000"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    async fn deposit(app: &Router, owner: &str, asset: &str, amount: &str) {
        let (status, _) = send(
            app,
            "POST",
            "/api/v1/wallets/deposit",
            Some(json!({ "owner": owner, "venue": "ETH-USDC", "asset": asset, "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_venue_and_duplicate() {
        let app = app_with_pool().await;

        let (status, body) = send(&app, "GET", "/api/v1/venues/ETH-USDC", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["current_tick"], 0);
        assert_eq!(body["last_boundary"], 0);
        assert_eq!(body["scan_state"], "idle");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/venues",
            Some(json!({ "venue": "ETH-USDC", "tick_spacing": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["message"].as_str().unwrap().contains("already registered"));
    }

    #[tokio::test]
    async fn test_unknown_venue_is_not_found() {
        let (status, _) = send(&app(), "GET", "/api/v1/venues/BTC-USDC", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_place_order_without_funds_is_rejected() {
        let app = app_with_pool().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/orders",
            Some(json!({
                "owner": "alice",
                "venue": "ETH-USDC",
                "target_tick": 55,
                "direction": "zero_for_one",
                "amount": "100"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&app, "GET", "/api/v1/venues/ETH-USDC/positions", None).await;
        assert_eq!(body["positions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_order_fills_on_swap_and_redeems() {
        let app = app_with_pool().await;
        deposit(&app, "alice", "token0", "100").await;
        deposit(&app, "bob", "token1", "50000").await;

        let (status, placed) = send(
            &app,
            "POST",
            "/api/v1/orders",
            Some(json!({
                "owner": "alice",
                "venue": "ETH-USDC",
                "target_tick": 55,
                "direction": "zero_for_one",
                "amount": "100"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(placed["boundary"], 50);

        // Buying token0 pushes the price up through the order's boundary
        let (status, trade) = send(
            &app,
            "POST",
            "/api/v1/swaps",
            Some(json!({
                "trader": "bob",
                "venue": "ETH-USDC",
                "direction": "one_for_zero",
                "amount_in": "50000"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trade["scan"]["fills"].as_array().unwrap().len(), 1);

        let (status, receipt) = send(
            &app,
            "GET",
            "/api/v1/receipts?venue=ETH-USDC&tick=50&direction=zero_for_one&owner=alice",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["outstanding"], "0");
        assert_eq!(receipt["holding"], "100");

        let (status, redemption) = send(
            &app,
            "POST",
            "/api/v1/redemptions",
            Some(json!({
                "owner": "alice",
                "venue": "ETH-USDC",
                "boundary": 50,
                "direction": "zero_for_one",
                "amount": "100"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(redemption["payout"], receipt["redeemable"]);
        assert_eq!(redemption["remaining_supply"], "0");

        let (_, metrics) = send(&app, "GET", "/api/v1/metrics/scan", None).await;
        assert_eq!(metrics["passes"], 1);
        assert_eq!(metrics["total_fills"], 1);
    }

    #[tokio::test]
    async fn test_cancel_refunds_wallet() {
        let app = app_with_pool().await;
        deposit(&app, "alice", "token0", "100").await;

        let order = json!({
            "owner": "alice",
            "venue": "ETH-USDC",
            "target_tick": 55,
            "direction": "zero_for_one",
            "amount": "40"
        });
        let (status, _) = send(&app, "POST", "/api/v1/orders", Some(order)).await;
        assert_eq!(status, StatusCode::CREATED);

        let cancel = json!({
            "owner": "alice",
            "venue": "ETH-USDC",
            "target_tick": 55,
            "direction": "zero_for_one"
        });
        let (status, cancelled) = send(&app, "POST", "/api/v1/orders/cancel", Some(cancel.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["refunded"], "40");

        let (status, _) = send(&app, "POST", "/api/v1/orders/cancel", Some(cancel)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, wallet) = send(&app, "GET", "/api/v1/wallets/alice", None).await;
        assert_eq!(wallet["balances"][0]["balance"], "100");
    }

    #[tokio::test]
    async fn test_order_identity_normalizes_target() {
        let app = app_with_pool().await;
        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/orders/identity?venue=ETH-USDC&tick=-15&direction=one_for_zero",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order_id"]["boundary"], -20);
        assert_eq!(body["key"], "ETH-USDC/-20/one_for_zero");
    }

    #[tokio::test]
    async fn test_out_of_range_target_tick_is_bad_request() {
        let app = app_with_pool().await;
        deposit(&app, "alice", "token0", "100").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/orders",
            Some(json!({
                "owner": "alice",
                "venue": "ETH-USDC",
                "target_tick": i32::MIN,
                "direction": "zero_for_one",
                "amount": "10"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("outside"));

        let uri = format!(
            "/api/v1/orders/identity?venue=ETH-USDC&tick={}&direction=one_for_zero",
            i32::MAX
        );
        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_transfer_receipts_lists_holders() {
        let app = app_with_pool().await;
        deposit(&app, "alice", "token0", "100").await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/orders",
            Some(json!({
                "owner": "alice",
                "venue": "ETH-USDC",
                "target_tick": 55,
                "direction": "zero_for_one",
                "amount": "100"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let transfer = |amount: &str| {
            json!({
                "from": "alice",
                "to": "bob",
                "venue": "ETH-USDC",
                "boundary": 50,
                "direction": "zero_for_one",
                "amount": amount
            })
        };
        let (status, body) = send(&app, "POST", "/api/v1/receipts/transfer", Some(transfer("30"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["holding"], "30");
        assert_eq!(body["holders"][0]["owner"], "alice");
        assert_eq!(body["holders"][0]["balance"], "70");
        assert_eq!(body["holders"][1]["owner"], "bob");

        let (status, _) = send(&app, "POST", "/api/v1/receipts/transfer", Some(transfer("71"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_status_follows_error_category() {
        use crate::engine::TakeProfitError;
        use crate::host::LedgerError;
        use crate::models::{Direction, OrderId, VenueId};
        use axum::response::IntoResponse;
        use rust_decimal_macros::dec;

        let id = OrderId::new(VenueId::new("ETH-USDC"), 100, Direction::ZeroForOne);
        let cases = [
            (TakeProfitError::InvalidTick(i32::MAX), StatusCode::BAD_REQUEST),
            (
                TakeProfitError::InsufficientOutstanding {
                    order_id: id.clone(),
                    outstanding: dec!(1),
                    requested: dec!(2),
                },
                StatusCode::BAD_REQUEST,
            ),
            (TakeProfitError::NoOrder(id), StatusCode::NOT_FOUND),
            (
                TakeProfitError::VenueAlreadyRegistered(VenueId::new("ETH-USDC")),
                StatusCode::CONFLICT,
            ),
            (TakeProfitError::Ledger(LedgerError::Overflow), StatusCode::INTERNAL_SERVER_ERROR),
            (TakeProfitError::ArithmeticOverflow, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
