//! Fulfillment scanner
//!
//! Runs after every completed trade on a venue. It compares the venue's
//! current boundary with the one recorded after the previous pass and fills,
//! one boundary at a time and in the order price moved, every resting
//! position on the side opposite the trade.
//!
//! # Algorithm
//!
//! 1. `last` = tracked boundary, `current` = normalized live tick. Equal
//!    means nothing was crossed.
//! 2. Walk boundaries strictly between `last` and `current` in the direction
//!    of movement. At the first one holding a positive amount, sell all of it
//!    at market.
//! 3. A fill moves the market, so re-read `current` and continue from the
//!    boundary just filled. Earlier boundaries are never revisited.
//! 4. When nothing crossed is left, record `current`.
//!
//! A pass fills at most `max_fills_per_pass` boundaries. Hitting the cap
//! records the boundary just before the first unfilled one, so the next
//! trade's pass picks up exactly where this one stopped.
//!
//! Every fill is itself a trade and fires the trade-completed callback. The
//! per-venue `ScanState` turns that nested call into a no-op.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::host::{Custody, Exchange, Ledger, PriceLimit};
use crate::models::{
    normalize_tick, Direction, FillRecord, OrderId, ScanOutcome, ScanReport, Tick, VenueId,
};

use super::errors::TakeProfitError;
use super::journal::Journal;
use super::order_book::Movement;
use super::take_profit::TakeProfitEngine;

/// Per-venue reentrancy guard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

impl<X: Exchange, L: Ledger, C: Custody> TakeProfitEngine<X, L, C> {
    /// Trade-completed callback body, sharing the caller's journal
    pub(super) fn scan_venue(
        &mut self,
        venue: &VenueId,
        trade_direction: Direction,
        journal: &mut Journal,
    ) -> Result<ScanReport, TakeProfitError> {
        let spacing = self.venue_config(venue)?.tick_spacing;
        if self.scan_state(venue) == ScanState::Scanning {
            debug!(%venue, %trade_direction, "Nested trade callback absorbed");
            return Ok(ScanReport::absorbed(venue.clone(), trade_direction));
        }

        self.scan_states.insert(venue.clone(), ScanState::Scanning);
        let result = self.run_scan(venue, spacing, trade_direction, journal);
        self.scan_states.insert(venue.clone(), ScanState::Idle);
        result
    }

    fn run_scan(
        &mut self,
        venue: &VenueId,
        spacing: Tick,
        trade_direction: Direction,
        journal: &mut Journal,
    ) -> Result<ScanReport, TakeProfitError> {
        let fill_direction = trade_direction.opposite();
        let last = self
            .ticks
            .get(venue)
            .ok_or_else(|| TakeProfitError::UnknownVenue(venue.clone()))?;
        let mut current = normalize_tick(self.exchange.current_tick(venue)?, spacing);

        let Some(movement) = Movement::between(last, current) else {
            debug!(%venue, boundary = last, "No boundary crossed");
            return Ok(ScanReport::unchanged(venue.clone(), trade_direction, last));
        };
        debug!(%venue, from = last, to = current, ?movement, %fill_direction, "Scanning crossed boundaries");

        let mut fills = Vec::new();
        let mut cursor = last;
        while let Some((boundary, _)) =
            self.book
                .next_resting(venue, fill_direction, cursor, current, movement)
        {
            if fills.len() >= self.config.max_fills_per_pass {
                let resume_from = match movement {
                    Movement::Up => boundary.saturating_sub(spacing),
                    Movement::Down => boundary.saturating_add(spacing),
                };
                self.record_boundary(journal, venue, resume_from);

                let budget = TakeProfitError::ScanBudgetExceeded {
                    venue: venue.clone(),
                    drained: fills.len(),
                    resume_from,
                };
                warn!(%venue, error = %budget, "Fulfillment pass stopped early");
                return Ok(ScanReport {
                    venue: venue.clone(),
                    trade_direction,
                    outcome: ScanOutcome::BudgetExceeded,
                    from_boundary: Some(last),
                    to_boundary: Some(resume_from),
                    fills,
                });
            }

            let order_id = OrderId::new(venue.clone(), boundary, fill_direction);
            fills.push(self.execute_fill(&order_id, journal)?);

            cursor = boundary;
            current = normalize_tick(self.exchange.current_tick(venue)?, spacing);
        }

        self.record_boundary(journal, venue, current);
        Ok(ScanReport {
            venue: venue.clone(),
            trade_direction,
            outcome: ScanOutcome::Completed,
            from_boundary: Some(last),
            to_boundary: Some(current),
            fills,
        })
    }

    /// Sell the whole position at `order_id`'s boundary at market
    fn execute_fill(&mut self, order_id: &OrderId, journal: &mut Journal) -> Result<FillRecord, TakeProfitError> {
        let venue = &order_id.venue;
        let tick_before = self.exchange.current_tick(venue)?;

        let amount = self.drain_position(journal, order_id);
        let proceeds = self
            .exchange
            .swap(venue, order_id.direction, amount, PriceLimit::Unbounded)?;
        let tick_after = self.exchange.current_tick(venue)?;

        self.touch_receipt(journal, order_id);
        let claimable = self.receipts.credit_claimable(order_id, proceeds)?;
        info!(
            %order_id,
            amount = %amount,
            proceeds = %proceeds,
            claimable = %claimable,
            tick_before,
            tick_after,
            "Take-profit fill executed"
        );

        // The fill is a trade on this venue like any other
        self.scan_venue(venue, order_id.direction, journal)?;

        Ok(FillRecord::new(order_id.clone(), amount, proceeds, tick_before, tick_after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{engine_at, engine_with_venue, ScriptedEngine, VENUE};
    use crate::models::Asset;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn venue() -> VenueId {
        VenueId::new(VENUE)
    }

    fn place(engine: &mut ScriptedEngine, target: Tick, direction: Direction, amount: Decimal) -> OrderId {
        engine
            .custody_mut()
            .deposit("alice", &venue(), direction.input_asset(), amount)
            .unwrap();
        engine
            .place_order("alice", &venue(), target, direction, amount)
            .unwrap()
            .order_id
    }

    fn boundaries(report: &ScanReport) -> Vec<Tick> {
        report.fills.iter().map(|fill| fill.order_id.boundary).collect()
    }

    #[test]
    fn test_single_crossing_fills_once() {
        let mut engine = engine_with_venue(10);
        let id = place(&mut engine, 105, Direction::ZeroForOne, dec!(50));
        assert_eq!(id.boundary, 100);

        engine.exchange_mut().set_tick(&venue(), 120);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(report.outcome, ScanOutcome::Completed);
        assert_eq!(boundaries(&report), vec![100]);
        assert_eq!(report.fills[0].amount, dec!(50));
        assert_eq!(report.total_proceeds(), dec!(50));
        assert_eq!(engine.outstanding(&id), dec!(0));
        assert_eq!(engine.receipt(&id).unwrap().claimable_total, dec!(50));
        assert_eq!(engine.last_boundary(&venue()), Some(120));
        assert_eq!(engine.exchange().calls.len(), 1);
    }

    #[test]
    fn test_rescan_without_movement_is_noop() {
        let mut engine = engine_with_venue(10);
        place(&mut engine, 105, Direction::ZeroForOne, dec!(50));
        engine.exchange_mut().set_tick(&venue(), 120);

        engine.after_trade(&venue(), Direction::OneForZero).unwrap();
        let second = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(second.outcome, ScanOutcome::Unchanged);
        assert!(second.fills.is_empty());
        assert_eq!(engine.exchange().calls.len(), 1);
        assert_eq!(engine.last_boundary(&venue()), Some(120));
    }

    #[test]
    fn test_multiple_boundaries_fill_in_price_order() {
        let mut engine = engine_with_venue(10);
        for target in [120, 100, 110] {
            place(&mut engine, target, Direction::ZeroForOne, dec!(10));
        }

        engine.exchange_mut().set_tick(&venue(), 135);
        engine.exchange_mut().script_after_swap(&venue(), &[133, 131, 130]);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(boundaries(&report), vec![100, 110, 120]);
        let ticks: Vec<Tick> = report.fills.iter().map(|fill| fill.tick_before).collect();
        assert_eq!(ticks, vec![135, 133, 131]);
        assert_eq!(engine.last_boundary(&venue()), Some(130));
    }

    #[test]
    fn test_fill_impact_extends_range() {
        let mut engine = engine_with_venue(10);
        let low = place(&mut engine, 100, Direction::ZeroForOne, dec!(10));
        let high = place(&mut engine, 140, Direction::ZeroForOne, dec!(10));

        engine.exchange_mut().set_tick(&venue(), 115);
        engine.exchange_mut().script_after_swap(&venue(), &[152]);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(boundaries(&report), vec![100, 140]);
        assert_eq!(engine.outstanding(&low), dec!(0));
        assert_eq!(engine.outstanding(&high), dec!(0));
        assert_eq!(engine.last_boundary(&venue()), Some(150));
    }

    #[test]
    fn test_fill_pushing_price_back_stops_pass() {
        let mut engine = engine_with_venue(10);
        place(&mut engine, 100, Direction::ZeroForOne, dec!(10));
        let untouched = place(&mut engine, 120, Direction::ZeroForOne, dec!(10));

        engine.exchange_mut().set_tick(&venue(), 135);
        engine.exchange_mut().script_after_swap(&venue(), &[104]);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(boundaries(&report), vec![100]);
        assert_eq!(engine.outstanding(&untouched), dec!(10));
        assert_eq!(engine.last_boundary(&venue()), Some(100));
    }

    #[test]
    fn test_landing_boundary_waits_for_next_pass() {
        let mut engine = engine_with_venue(10);
        for target in [100, 110, 120] {
            place(&mut engine, target, Direction::ZeroForOne, dec!(10));
        }
        let landing = OrderId::new(venue(), 120, Direction::ZeroForOne);

        // 125 lands in the 120 boundary, which is not crossed yet
        engine.exchange_mut().set_tick(&venue(), 125);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(boundaries(&report), vec![100, 110]);
        assert_eq!(engine.outstanding(&landing), dec!(10));
        assert_eq!(engine.last_boundary(&venue()), Some(120));

        let unchanged = engine.after_trade(&venue(), Direction::OneForZero).unwrap();
        assert_eq!(unchanged.outcome, ScanOutcome::Unchanged);
        assert_eq!(engine.outstanding(&landing), dec!(10));

        engine.exchange_mut().set_tick(&venue(), 135);
        let next = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(boundaries(&next), vec![120]);
        assert_eq!(engine.outstanding(&landing), dec!(0));
        assert_eq!(engine.last_boundary(&venue()), Some(130));
    }

    #[test]
    fn test_only_opposite_side_is_filled() {
        let mut engine = engine_with_venue(10);
        let same_side = place(&mut engine, 100, Direction::OneForZero, dec!(10));

        engine.exchange_mut().set_tick(&venue(), 120);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert!(report.fills.is_empty());
        assert_eq!(engine.outstanding(&same_side), dec!(10));
        assert_eq!(engine.last_boundary(&venue()), Some(120));
    }

    #[test]
    fn test_falling_price_scans_negative_ticks_descending() {
        let mut engine = engine_at(5, 60, 64);
        assert_eq!(engine.last_boundary(&venue()), Some(0));

        let near = place(&mut engine, -1, Direction::OneForZero, dec!(10));
        let far = place(&mut engine, -61, Direction::OneForZero, dec!(10));
        let beyond = place(&mut engine, -200, Direction::OneForZero, dec!(10));
        assert_eq!((near.boundary, far.boundary, beyond.boundary), (-60, -120, -240));

        engine.exchange_mut().set_tick(&venue(), -130);
        let report = engine.after_trade(&venue(), Direction::ZeroForOne).unwrap();

        assert_eq!(boundaries(&report), vec![-60, -120]);
        assert_eq!(engine.outstanding(&beyond), dec!(10));
        assert_eq!(engine.last_boundary(&venue()), Some(-180));
    }

    #[test]
    fn test_budget_defers_remaining_crossings() {
        let mut engine = engine_at(95, 10, 2);
        for target in [100, 110, 120] {
            place(&mut engine, target, Direction::ZeroForOne, dec!(10));
        }
        let last = engine.order_id_for(&venue(), 120, Direction::ZeroForOne).unwrap();

        engine.exchange_mut().set_tick(&venue(), 135);
        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(report.outcome, ScanOutcome::BudgetExceeded);
        assert_eq!(boundaries(&report), vec![100, 110]);
        assert_eq!(report.to_boundary, Some(110));
        assert_eq!(engine.last_boundary(&venue()), Some(110));
        assert_eq!(engine.outstanding(&last), dec!(10));

        let resumed = engine.after_trade(&venue(), Direction::OneForZero).unwrap();
        assert_eq!(resumed.outcome, ScanOutcome::Completed);
        assert_eq!(boundaries(&resumed), vec![120]);
        assert_eq!(engine.last_boundary(&venue()), Some(130));
    }

    #[test]
    fn test_nested_callback_is_absorbed() {
        let mut engine = engine_with_venue(10);
        engine.scan_states.insert(venue(), ScanState::Scanning);
        engine.exchange_mut().set_tick(&venue(), 120);

        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(report.outcome, ScanOutcome::Absorbed);
        assert_eq!(engine.last_boundary(&venue()), Some(90));
    }

    #[test]
    fn test_fills_do_not_double_process() {
        let mut engine = engine_with_venue(10);
        let id = place(&mut engine, 100, Direction::ZeroForOne, dec!(10));
        engine.exchange_mut().set_tick(&venue(), 125);

        let report = engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(report.fills.len(), 1);
        assert_eq!(engine.exchange().calls.len(), 1);
        assert_eq!(engine.receipt(&id).unwrap().claimable_total, dec!(10));
        assert_eq!(engine.scan_state(&venue()), ScanState::Idle);
    }

    #[test]
    fn test_failed_fill_reverts_whole_pass() {
        let mut engine = engine_with_venue(10);
        let first = place(&mut engine, 100, Direction::ZeroForOne, dec!(10));
        let second = place(&mut engine, 110, Direction::ZeroForOne, dec!(10));

        engine.exchange_mut().set_tick(&venue(), 135);
        engine.exchange_mut().script_after_swap(&venue(), &[133]);
        engine.exchange_mut().fail_on_swap(2);

        let err = engine.after_trade(&venue(), Direction::OneForZero).unwrap_err();

        assert!(matches!(err, TakeProfitError::SwapFailed(_)));
        assert_eq!(engine.outstanding(&first), dec!(10));
        assert_eq!(engine.outstanding(&second), dec!(10));
        assert_eq!(engine.receipt(&first).unwrap().claimable_total, dec!(0));
        assert_eq!(engine.last_boundary(&venue()), Some(90));
        assert_eq!(engine.exchange().current_tick(&venue()).unwrap(), 135);
        assert_eq!(engine.scan_state(&venue()), ScanState::Idle);
        assert_eq!(
            engine.custody().balance("alice", &venue(), Asset::Token0),
            dec!(0)
        );
    }

    #[test]
    fn test_claimable_only_grows_from_fills() {
        let mut engine = engine_with_venue(10);
        engine.exchange_mut().set_rate(dec!(2));
        let id = place(&mut engine, 100, Direction::ZeroForOne, dec!(10));

        engine.exchange_mut().set_tick(&venue(), 115);
        engine.after_trade(&venue(), Direction::OneForZero).unwrap();
        let after_first = engine.receipt(&id).unwrap().claimable_total;

        // Price returns below the boundary and a new deposit rests there
        engine.exchange_mut().set_tick(&venue(), 95);
        engine.after_trade(&venue(), Direction::ZeroForOne).unwrap();
        place(&mut engine, 100, Direction::ZeroForOne, dec!(5));
        assert_eq!(engine.receipt(&id).unwrap().claimable_total, after_first);

        engine.exchange_mut().set_tick(&venue(), 115);
        engine.after_trade(&venue(), Direction::OneForZero).unwrap();

        assert_eq!(after_first, dec!(20));
        assert_eq!(engine.receipt(&id).unwrap().claimable_total, dec!(30));
    }
}
