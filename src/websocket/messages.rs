use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    CancelledOrder, Direction, FillRecord, OrderId, PlacedOrder, Redemption, ScanOutcome, ScanReport,
    Tick, TradeExecution, VenueId,
};

/// WebSocket message types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Resting positions of a venue, sent on subscription
    PositionsSnapshot {
        venue: VenueId,
        last_boundary: Option<Tick>,
        positions: Vec<PositionLevel>,
        timestamp: DateTime<Utc>,
    },
    OrderPlaced {
        venue: VenueId,
        order_id: OrderId,
        amount: Decimal,
        outstanding: Decimal,
        timestamp: DateTime<Utc>,
    },
    OrderCancelled {
        venue: VenueId,
        order_id: OrderId,
        refunded: Decimal,
        outstanding: Decimal,
        timestamp: DateTime<Utc>,
    },
    /// One boundary sold at market
    Fill {
        venue: VenueId,
        fill_id: String,
        order_id: OrderId,
        amount: Decimal,
        proceeds: Decimal,
        tick_before: Tick,
        tick_after: Tick,
        timestamp: DateTime<Utc>,
    },
    /// Summary of a fulfillment pass
    Scan {
        venue: VenueId,
        outcome: ScanOutcome,
        from_boundary: Option<Tick>,
        to_boundary: Option<Tick>,
        fills: usize,
        timestamp: DateTime<Utc>,
    },
    Redeemed {
        venue: VenueId,
        order_id: OrderId,
        burned: Decimal,
        payout: Decimal,
        timestamp: DateTime<Utc>,
    },
    /// Trader swap routed through the venue
    Swap {
        venue: VenueId,
        direction: Direction,
        amount_in: Decimal,
        amount_out: Decimal,
        tick_after: Tick,
        timestamp: DateTime<Utc>,
    },
    /// Subscription confirmation
    Subscribed {
        channel: String,
        venue: Option<String>,
    },
    /// Unsubscription confirmation
    Unsubscribed {
        channel: String,
        venue: Option<String>,
    },
    /// Error message
    Error {
        message: String,
    },
    /// Heartbeat/Ping
    Ping {
        timestamp: DateTime<Utc>,
    },
    /// Pong response
    Pong {
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLevel {
    pub boundary: Tick,
    pub direction: Direction,
    pub outstanding: Decimal,
}

/// Client subscription request
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        channel: String,
        venue: Option<String>,
    },
    Unsubscribe {
        channel: String,
        venue: Option<String>,
    },
    Ping,
}

impl WsMessage {
    pub fn placed(placed: &PlacedOrder) -> Self {
        WsMessage::OrderPlaced {
            venue: placed.order_id.venue.clone(),
            order_id: placed.order_id.clone(),
            amount: placed.amount,
            outstanding: placed.outstanding,
            timestamp: Utc::now(),
        }
    }

    pub fn cancelled(cancelled: &CancelledOrder) -> Self {
        WsMessage::OrderCancelled {
            venue: cancelled.order_id.venue.clone(),
            order_id: cancelled.order_id.clone(),
            refunded: cancelled.refunded,
            outstanding: cancelled.outstanding,
            timestamp: Utc::now(),
        }
    }

    pub fn fill(fill: &FillRecord) -> Self {
        WsMessage::Fill {
            venue: fill.order_id.venue.clone(),
            fill_id: fill.id.to_string(),
            order_id: fill.order_id.clone(),
            amount: fill.amount,
            proceeds: fill.proceeds,
            tick_before: fill.tick_before,
            tick_after: fill.tick_after,
            timestamp: fill.timestamp,
        }
    }

    pub fn scan(report: &ScanReport) -> Self {
        WsMessage::Scan {
            venue: report.venue.clone(),
            outcome: report.outcome,
            from_boundary: report.from_boundary,
            to_boundary: report.to_boundary,
            fills: report.fills.len(),
            timestamp: Utc::now(),
        }
    }

    pub fn redeemed(redemption: &Redemption) -> Self {
        WsMessage::Redeemed {
            venue: redemption.order_id.venue.clone(),
            order_id: redemption.order_id.clone(),
            burned: redemption.burned,
            payout: redemption.payout,
            timestamp: Utc::now(),
        }
    }

    pub fn swap(venue: &VenueId, direction: Direction, trade: &TradeExecution) -> Self {
        WsMessage::Swap {
            venue: venue.clone(),
            direction,
            amount_in: trade.amount_in,
            amount_out: trade.amount_out,
            tick_after: trade.tick_after,
            timestamp: Utc::now(),
        }
    }
}
