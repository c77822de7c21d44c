//! Take-profit engine
//!
//! `TakeProfitEngine` owns the three state stores and the external
//! collaborators, and exposes placement, cancellation, redemption and the
//! trade-completed callback. Each public mutating call is all-or-nothing: it
//! either completes or leaves every store, the ledger, custody and the venue
//! exactly as it found them.
//!
//! Calls take `&mut self`; a host sharing the engine across tasks wraps it
//! in a mutex so calls never interleave.

use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::host::{Custody, Exchange, InMemoryCustody, InMemoryLedger, Ledger, PriceLimit, SimulatedExchange};
use crate::models::{
    CancelledOrder, Direction, OrderId, PlacedOrder, ReceiptRecord, Redemption, ScanReport, Tick,
    TradeExecution, VenueConfig, VenueId,
};

use super::errors::TakeProfitError;
use super::order_book::OrderBook;
use super::receipts::ReceiptAccounting;
use super::scanner::ScanState;
use super::tick_tracker::TickTracker;
use super::validation::{validate_amount, validate_spacing, validate_tick};

/// Engine wired to the in-process reference collaborators
pub type SimulatedEngine = TakeProfitEngine<SimulatedExchange, InMemoryLedger, InMemoryCustody>;

/// Simulated engine shared between request handlers
pub type SharedEngine = Arc<Mutex<SimulatedEngine>>;

pub struct TakeProfitEngine<X, L, C> {
    pub(super) config: EngineConfig,
    pub(super) venues: HashMap<VenueId, VenueConfig>,
    pub(super) exchange: X,
    pub(super) ledger: L,
    pub(super) custody: C,
    pub(super) book: OrderBook,
    pub(super) receipts: ReceiptAccounting,
    pub(super) ticks: TickTracker,
    pub(super) scan_states: HashMap<VenueId, ScanState>,
}

impl<X: Exchange, L: Ledger, C: Custody> TakeProfitEngine<X, L, C> {
    pub fn new(exchange: X, ledger: L, custody: C, mut config: EngineConfig) -> Self {
        if config.max_fills_per_pass == 0 {
            warn!("max_fills_per_pass of 0 would never fill; using 1");
            config.max_fills_per_pass = 1;
        }

        Self {
            config,
            venues: HashMap::new(),
            exchange,
            ledger,
            custody,
            book: OrderBook::new(),
            receipts: ReceiptAccounting::new(),
            ticks: TickTracker::new(),
            scan_states: HashMap::new(),
        }
    }

    /// Start tracking a venue, seeding its last boundary from the live price
    pub fn register_venue(&mut self, venue: VenueId, config: VenueConfig) -> Result<Tick, TakeProfitError> {
        validate_spacing(config.tick_spacing)?;
        if self.venues.contains_key(&venue) {
            return Err(TakeProfitError::VenueAlreadyRegistered(venue));
        }

        let tick = self.exchange.current_tick(&venue)?;
        let boundary = config.boundary_of(tick);
        self.ticks.record(&venue, boundary);
        self.scan_states.insert(venue.clone(), ScanState::Idle);
        self.venues.insert(venue.clone(), config);

        info!(%venue, tick, boundary, spacing = config.tick_spacing, "Venue registered");
        Ok(boundary)
    }

    /// Deposit `amount` to be sold once the venue crosses `target_tick`
    pub fn place_order(
        &mut self,
        owner: &str,
        venue: &VenueId,
        target_tick: Tick,
        direction: Direction,
        amount: Decimal,
    ) -> Result<PlacedOrder, TakeProfitError> {
        validate_amount(amount)?;
        let order_id = self.order_id_for(venue, target_tick, direction)?;

        let placed = self.atomically("place_order", |engine, journal| {
            engine.collect_asset(journal, owner, venue, direction.input_asset(), amount)?;
            let outstanding = engine.credit_position(journal, &order_id, amount)?;

            engine.touch_receipt(journal, &order_id);
            engine.receipts.ensure(&order_id);
            engine.mint_receipts(journal, owner, &order_id, amount)?;
            engine.receipts.add_supply(&order_id, amount)?;

            Ok(PlacedOrder {
                order_id: order_id.clone(),
                boundary: order_id.boundary,
                amount,
                outstanding,
            })
        })?;

        info!(
            %owner,
            order_id = %placed.order_id,
            target_tick,
            amount = %amount,
            outstanding = %placed.outstanding,
            "Take-profit order placed"
        );
        Ok(placed)
    }

    /// Withdraw the caller's whole holding from the still-unfilled pool
    pub fn cancel_order(
        &mut self,
        owner: &str,
        venue: &VenueId,
        target_tick: Tick,
        direction: Direction,
    ) -> Result<CancelledOrder, TakeProfitError> {
        let order_id = self.order_id_for(venue, target_tick, direction)?;
        let amount = self.ledger.balance_of(owner, &order_id);
        if amount <= Decimal::ZERO {
            return Err(TakeProfitError::NoOrder(order_id));
        }

        let cancelled = self.atomically("cancel_order", |engine, journal| {
            let outstanding = engine.debit_position(journal, &order_id, amount)?;
            engine.burn_receipts(journal, owner, &order_id, amount)?;
            engine.touch_receipt(journal, &order_id);
            engine.receipts.remove_supply(&order_id, amount)?;
            engine.release_asset(journal, owner, venue, direction.input_asset(), amount)?;

            Ok(CancelledOrder {
                order_id: order_id.clone(),
                refunded: amount,
                outstanding,
            })
        })?;

        info!(%owner, order_id = %cancelled.order_id, refunded = %amount, "Take-profit order cancelled");
        Ok(cancelled)
    }

    /// Burn `amount` receipts for their share of the filled proceeds
    pub fn redeem(
        &mut self,
        owner: &str,
        order_id: &OrderId,
        amount: Decimal,
        destination: &str,
    ) -> Result<Redemption, TakeProfitError> {
        validate_amount(amount)?;
        let held = self.ledger.balance_of(owner, order_id);
        if held < amount {
            return Err(TakeProfitError::InsufficientBalance {
                order_id: order_id.clone(),
                held,
                requested: amount,
            });
        }
        let payout = self.preview_redeem(order_id, amount)?;

        let redemption = self.atomically("redeem", |engine, journal| {
            engine.touch_receipt(journal, order_id);
            let record = engine.receipts.settle_redemption(order_id, amount, payout)?.clone();
            engine.burn_receipts(journal, owner, order_id, amount)?;
            engine.release_asset(
                journal,
                destination,
                &order_id.venue,
                order_id.direction.output_asset(),
                payout,
            )?;

            Ok(Redemption {
                order_id: order_id.clone(),
                destination: destination.to_string(),
                burned: amount,
                payout,
                remaining_supply: record.total_supply,
                remaining_claimable: record.claimable_total,
            })
        })?;

        info!(
            %owner,
            %order_id,
            burned = %amount,
            payout = %payout,
            %destination,
            "Receipts redeemed"
        );
        Ok(redemption)
    }

    /// Trade-completed callback: fill whatever the last trade crossed
    ///
    /// A failing fill reverts the whole pass, including the venue itself.
    pub fn after_trade(&mut self, venue: &VenueId, trade_direction: Direction) -> Result<ScanReport, TakeProfitError> {
        let checkpoint = self.exchange.checkpoint(venue);
        let result = self.atomically("after_trade", |engine, journal| {
            engine.scan_venue(venue, trade_direction, journal)
        });
        if result.is_err() {
            self.exchange.restore(venue, checkpoint);
        }
        result
    }

    /// Route a trader's market swap through the venue, then run the
    /// trade-completed callback; if the callback fails the swap is undone too
    pub fn execute_swap(
        &mut self,
        trader: &str,
        venue: &VenueId,
        direction: Direction,
        amount_in: Decimal,
        limit: PriceLimit,
    ) -> Result<TradeExecution, TakeProfitError> {
        validate_amount(amount_in)?;
        self.venue_config(venue)?;

        let checkpoint = self.exchange.checkpoint(venue);
        let result = self.atomically("execute_swap", |engine, journal| {
            let tick_before = engine.exchange.current_tick(venue)?;
            engine.collect_asset(journal, trader, venue, direction.input_asset(), amount_in)?;
            let amount_out = engine.exchange.swap(venue, direction, amount_in, limit)?;
            engine.release_asset(journal, trader, venue, direction.output_asset(), amount_out)?;
            let tick_after = engine.exchange.current_tick(venue)?;

            let scan = engine.scan_venue(venue, direction, journal)?;
            Ok(TradeExecution {
                amount_in,
                amount_out,
                tick_before,
                tick_after,
                scan,
            })
        });

        match &result {
            Ok(trade) => info!(
                %trader,
                %venue,
                %direction,
                amount_in = %amount_in,
                amount_out = %trade.amount_out,
                tick_after = trade.tick_after,
                fills = trade.scan.fills.len(),
                "Swap executed"
            ),
            Err(_) => self.exchange.restore(venue, checkpoint),
        }
        result
    }

    /// Identity a (venue, target, direction) triple resolves to
    pub fn order_id_for(&self, venue: &VenueId, target_tick: Tick, direction: Direction) -> Result<OrderId, TakeProfitError> {
        validate_tick(target_tick)?;
        let config = self.venue_config(venue)?;
        Ok(OrderId::for_target(venue, target_tick, config.tick_spacing, direction))
    }

    /// Payout `units` receipts would receive right now
    pub fn preview_redeem(&self, order_id: &OrderId, units: Decimal) -> Result<Decimal, TakeProfitError> {
        let record = self
            .receipts
            .get(order_id)
            .ok_or_else(|| TakeProfitError::ReceiptNotFound(order_id.clone()))?;
        record
            .payout_for(units)
            .ok_or(TakeProfitError::ArithmeticOverflow)
    }

    pub fn venue_config(&self, venue: &VenueId) -> Result<VenueConfig, TakeProfitError> {
        self.venues
            .get(venue)
            .copied()
            .ok_or_else(|| TakeProfitError::UnknownVenue(venue.clone()))
    }

    pub fn outstanding(&self, order_id: &OrderId) -> Decimal {
        self.book.outstanding(order_id)
    }

    pub fn positions(&self, venue: &VenueId) -> Vec<(OrderId, Decimal)> {
        self.book.positions_for(venue)
    }

    pub fn receipt(&self, order_id: &OrderId) -> Option<&ReceiptRecord> {
        self.receipts.get(order_id)
    }

    pub fn last_boundary(&self, venue: &VenueId) -> Option<Tick> {
        self.ticks.get(venue)
    }

    pub fn scan_state(&self, venue: &VenueId) -> ScanState {
        self.scan_states.get(venue).copied().unwrap_or_default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn exchange(&self) -> &X {
        &self.exchange
    }

    pub fn exchange_mut(&mut self) -> &mut X {
        &mut self.exchange
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn custody(&self) -> &C {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut C {
        &mut self.custody
    }
}

impl<X: Exchange, C: Custody> TakeProfitEngine<X, InMemoryLedger, C> {
    /// Move receipts between holders; supply and claimable proceeds stay put
    pub fn transfer_receipts(
        &mut self,
        from: &str,
        to: &str,
        order_id: &OrderId,
        amount: Decimal,
    ) -> Result<(), TakeProfitError> {
        validate_amount(amount)?;
        if self.receipts.get(order_id).is_none() {
            return Err(TakeProfitError::ReceiptNotFound(order_id.clone()));
        }
        let held = self.ledger.balance_of(from, order_id);
        if held < amount {
            return Err(TakeProfitError::InsufficientBalance {
                order_id: order_id.clone(),
                held,
                requested: amount,
            });
        }

        self.ledger.transfer(from, to, order_id, amount)?;
        info!(%from, %to, %order_id, amount = %amount, "Receipts transferred");
        Ok(())
    }

    /// Current receipt holders of one identity, sorted by owner
    pub fn holders(&self, order_id: &OrderId) -> Vec<(String, Decimal)> {
        self.ledger.holders_of(order_id)
    }
}

impl SimulatedEngine {
    pub fn simulated(config: EngineConfig) -> Self {
        Self::new(
            SimulatedExchange::new(),
            InMemoryLedger::new(),
            InMemoryCustody::new(),
            config,
        )
    }
}
