//! Outstanding take-profit positions
//!
//! Positions are keyed by (venue, boundary, direction). Each (venue,
//! direction) side keeps its boundaries in a `BTreeMap` so the scanner can
//! walk a crossed range in price order. Entries are never removed, a drained
//! boundary stays at zero.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use crate::models::{Direction, OrderId, Tick, VenueId};

use super::errors::TakeProfitError;

/// Which way the venue's boundary moved since the last pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Up,
    Down,
}

impl Movement {
    pub fn between(from: Tick, to: Tick) -> Option<Self> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Movement::Up),
            std::cmp::Ordering::Less => Some(Movement::Down),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Per-(venue, boundary, direction) outstanding-amount ledger
#[derive(Debug, Default)]
pub struct OrderBook {
    sides: HashMap<(VenueId, Direction), BTreeMap<Tick, Decimal>>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount awaiting a fill at the identity's boundary
    pub fn outstanding(&self, order_id: &OrderId) -> Decimal {
        self.entry(order_id).unwrap_or(Decimal::ZERO)
    }

    /// Raw entry, `None` if nothing was ever deposited at this key
    pub fn entry(&self, order_id: &OrderId) -> Option<Decimal> {
        self.sides
            .get(&(order_id.venue.clone(), order_id.direction))
            .and_then(|levels| levels.get(&order_id.boundary))
            .copied()
    }

    /// Add a deposit, returning the new outstanding amount
    pub fn credit(&mut self, order_id: &OrderId, amount: Decimal) -> Result<Decimal, TakeProfitError> {
        let level = self.level_mut(order_id);
        *level = level
            .checked_add(amount)
            .ok_or(TakeProfitError::ArithmeticOverflow)?;
        Ok(*level)
    }

    /// Remove a cancelled deposit, returning the new outstanding amount
    pub fn debit(&mut self, order_id: &OrderId, amount: Decimal) -> Result<Decimal, TakeProfitError> {
        let outstanding = self.outstanding(order_id);
        if outstanding < amount {
            return Err(TakeProfitError::InsufficientOutstanding {
                order_id: order_id.clone(),
                outstanding,
                requested: amount,
            });
        }
        let level = self.level_mut(order_id);
        *level = outstanding - amount;
        Ok(*level)
    }

    /// Zero the boundary after a fill, returning what it held
    pub fn drain(&mut self, order_id: &OrderId) -> Decimal {
        std::mem::replace(self.level_mut(order_id), Decimal::ZERO)
    }

    /// Put an entry back to a previously observed state
    pub(crate) fn restore(&mut self, order_id: &OrderId, previous: Option<Decimal>) {
        let key = (order_id.venue.clone(), order_id.direction);
        match previous {
            Some(amount) => {
                self.sides
                    .entry(key)
                    .or_default()
                    .insert(order_id.boundary, amount);
            }
            None => {
                if let Some(levels) = self.sides.get_mut(&key) {
                    levels.remove(&order_id.boundary);
                }
            }
        }
    }

    /// First boundary strictly between `after` and `before`, walking in
    /// `movement` order, that still holds a positive amount
    pub fn next_resting(
        &self,
        venue: &VenueId,
        direction: Direction,
        after: Tick,
        before: Tick,
        movement: Movement,
    ) -> Option<(Tick, Decimal)> {
        let levels = self.sides.get(&(venue.clone(), direction))?;
        let positive = |(tick, amount): (&Tick, &Decimal)| {
            (*amount > Decimal::ZERO).then_some((*tick, *amount))
        };

        match movement {
            Movement::Up if after < before => levels
                .range(after.saturating_add(1)..before)
                .find_map(positive),
            Movement::Down if before < after => levels
                .range(before.saturating_add(1)..after)
                .rev()
                .find_map(positive),
            _ => None,
        }
    }

    /// Every recorded boundary of a venue with its outstanding amount
    pub fn positions_for(&self, venue: &VenueId) -> Vec<(OrderId, Decimal)> {
        let mut positions: Vec<(OrderId, Decimal)> = self
            .sides
            .iter()
            .filter(|((side_venue, _), _)| side_venue == venue)
            .flat_map(|((side_venue, direction), levels)| {
                levels.iter().map(move |(boundary, amount)| {
                    (OrderId::new(side_venue.clone(), *boundary, *direction), *amount)
                })
            })
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    fn level_mut(&mut self, order_id: &OrderId) -> &mut Decimal {
        self.sides
            .entry((order_id.venue.clone(), order_id.direction))
            .or_default()
            .entry(order_id.boundary)
            .or_insert(Decimal::ZERO)
    }
}
