use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::order_id::OrderId;

/// Supply and claim bookkeeping for one pooled order
///
/// `total_supply` always equals the sum of every holder's receipt balance for
/// `order_id`. `claimable_total` only grows through fills and only shrinks
/// through redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReceiptRecord {
    pub order_id: OrderId,
    pub total_supply: Decimal,
    pub claimable_total: Decimal,
}

impl ReceiptRecord {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            total_supply: Decimal::ZERO,
            claimable_total: Decimal::ZERO,
        }
    }

    /// Proceeds owed for `units` receipt units, rounded down
    ///
    /// Every live unit is worth the same share of everything filled so far.
    /// Returns `None` on arithmetic overflow.
    pub fn payout_for(&self, units: Decimal) -> Option<Decimal> {
        if self.total_supply.is_zero() {
            return Some(Decimal::ZERO);
        }
        units
            .checked_mul(self.claimable_total)?
            .checked_div(self.total_supply)
            .map(|share| share.floor())
    }
}
