use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::order_id::OrderId;
use super::venue::{Direction, Tick, VenueId};

/// One boundary drained by the scanner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FillRecord {
    pub id: Uuid,
    pub order_id: OrderId,
    /// Amount of the input asset sold
    pub amount: Decimal,
    /// Amount of the output asset received and credited to claimable
    pub proceeds: Decimal,
    /// Venue tick immediately before the fill swap
    pub tick_before: Tick,
    /// Venue tick immediately after the fill swap
    pub tick_after: Tick,
    pub timestamp: DateTime<Utc>,
}

impl FillRecord {
    pub fn new(
        order_id: OrderId,
        amount: Decimal,
        proceeds: Decimal,
        tick_before: Tick,
        tick_after: Tick,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            amount,
            proceeds,
            tick_before,
            tick_after,
            timestamp: Utc::now(),
        }
    }

    /// Average execution price in output units per input unit
    pub fn average_price(&self) -> Option<Decimal> {
        self.proceeds.checked_div(self.amount)
    }
}

/// How a post-trade scan ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    /// The venue's boundary had not moved since the previous pass
    Unchanged,
    /// Every crossed boundary was examined and drained
    Completed,
    /// The per-pass fill cap was reached; later crossings wait for the next trade
    BudgetExceeded,
    /// A pass was already running for the venue, so this invocation did nothing
    Absorbed,
}

/// Result of one trade-completed callback
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScanReport {
    pub venue: VenueId,
    /// Direction of the trade that triggered the pass
    pub trade_direction: Direction,
    pub outcome: ScanOutcome,
    /// Boundary recorded before the pass, if a pass ran
    pub from_boundary: Option<Tick>,
    /// Boundary recorded after the pass, if a pass ran
    pub to_boundary: Option<Tick>,
    pub fills: Vec<FillRecord>,
}

impl ScanReport {
    pub fn absorbed(venue: VenueId, trade_direction: Direction) -> Self {
        Self {
            venue,
            trade_direction,
            outcome: ScanOutcome::Absorbed,
            from_boundary: None,
            to_boundary: None,
            fills: Vec::new(),
        }
    }

    pub fn unchanged(venue: VenueId, trade_direction: Direction, boundary: Tick) -> Self {
        Self {
            venue,
            trade_direction,
            outcome: ScanOutcome::Unchanged,
            from_boundary: Some(boundary),
            to_boundary: Some(boundary),
            fills: Vec::new(),
        }
    }

    pub fn total_proceeds(&self) -> Decimal {
        self.fills.iter().map(|fill| fill.proceeds).sum()
    }
}
