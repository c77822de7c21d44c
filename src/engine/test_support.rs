//! Scripted venue for engine tests
//!
//! Price moves are set directly or queued to happen after successive swaps,
//! so a test can describe exactly where the market goes after each fill.

use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};

use crate::config::EngineConfig;
use crate::host::{Exchange, InMemoryCustody, InMemoryLedger, PriceLimit, SwapError};
use crate::models::{Direction, Tick, VenueConfig, VenueId};

use super::take_profit::TakeProfitEngine;

pub const VENUE: &str = "ETH-USDC";
pub const VENUE_TICK: Tick = 95;

pub type ScriptedEngine = TakeProfitEngine<ScriptedExchange, InMemoryLedger, InMemoryCustody>;

#[derive(Debug, Clone, PartialEq)]
pub struct SwapCall {
    pub venue: VenueId,
    pub direction: Direction,
    pub amount_in: Decimal,
    pub tick_before: Tick,
}

#[derive(Debug, Clone)]
pub struct ScriptedVenue {
    tick: Tick,
    after_swap: VecDeque<Tick>,
}

#[derive(Debug)]
pub struct ScriptedExchange {
    venues: HashMap<VenueId, ScriptedVenue>,
    rate: Decimal,
    fail_on: Option<usize>,
    attempts: usize,
    pub calls: Vec<SwapCall>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self {
            venues: HashMap::new(),
            rate: Decimal::ONE,
            fail_on: None,
            attempts: 0,
            calls: Vec::new(),
        }
    }

    pub fn set_tick(&mut self, venue: &VenueId, tick: Tick) {
        self.venues
            .entry(venue.clone())
            .or_insert_with(|| ScriptedVenue {
                tick,
                after_swap: VecDeque::new(),
            })
            .tick = tick;
    }

    /// Queue the ticks the venue moves to after each following swap
    pub fn script_after_swap(&mut self, venue: &VenueId, ticks: &[Tick]) {
        if let Some(state) = self.venues.get_mut(venue) {
            state.after_swap.extend(ticks.iter().copied());
        }
    }

    /// Output received per unit sold
    pub fn set_rate(&mut self, rate: Decimal) {
        self.rate = rate;
    }

    /// Reject the `nth` swap attempt (1-based)
    pub fn fail_on_swap(&mut self, nth: usize) {
        self.fail_on = Some(nth);
    }
}

impl Exchange for ScriptedExchange {
    type Checkpoint = Option<ScriptedVenue>;

    fn current_tick(&self, venue: &VenueId) -> Result<Tick, SwapError> {
        self.venues
            .get(venue)
            .map(|state| state.tick)
            .ok_or_else(|| SwapError::UnknownVenue(venue.clone()))
    }

    fn swap(
        &mut self,
        venue: &VenueId,
        direction: Direction,
        amount_in: Decimal,
        _limit: PriceLimit,
    ) -> Result<Decimal, SwapError> {
        self.attempts += 1;
        let state = self
            .venues
            .get_mut(venue)
            .ok_or_else(|| SwapError::UnknownVenue(venue.clone()))?;

        self.calls.push(SwapCall {
            venue: venue.clone(),
            direction,
            amount_in,
            tick_before: state.tick,
        });
        if self.fail_on == Some(self.attempts) {
            return Err(SwapError::Rejected("scripted failure".to_string()));
        }

        if let Some(next) = state.after_swap.pop_front() {
            state.tick = next;
        }
        Ok(amount_in * self.rate)
    }

    fn checkpoint(&self, venue: &VenueId) -> Self::Checkpoint {
        self.venues.get(venue).cloned()
    }

    fn restore(&mut self, venue: &VenueId, checkpoint: Self::Checkpoint) {
        match checkpoint {
            Some(state) => {
                self.venues.insert(venue.clone(), state);
            }
            None => {
                self.venues.remove(venue);
            }
        }
    }
}

/// Engine with `VENUE` registered at `tick`
pub fn engine_at(tick: Tick, spacing: Tick, max_fills_per_pass: usize) -> ScriptedEngine {
    let venue = VenueId::new(VENUE);
    let mut exchange = ScriptedExchange::new();
    exchange.set_tick(&venue, tick);

    let mut engine = TakeProfitEngine::new(
        exchange,
        InMemoryLedger::new(),
        InMemoryCustody::new(),
        EngineConfig { max_fills_per_pass },
    );
    engine
        .register_venue(venue, VenueConfig::new(spacing))
        .expect("scripted venue registers");
    engine
}

/// Engine with `VENUE` registered at `VENUE_TICK` and the default budget
pub fn engine_with_venue(spacing: Tick) -> ScriptedEngine {
    engine_at(VENUE_TICK, spacing, EngineConfig::default().max_fills_per_pass)
}
