//! Swap execution venue
//!
//! The engine only needs two things from an AMM: the current price point and
//! an atomic market swap. `SimulatedExchange` is a constant-product reference
//! venue used by the server binary and by the engine tests.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{Direction, Tick, VenueId};

/// Lowest tick a venue can report
pub const MIN_TICK: Tick = -887_272;
/// Highest tick a venue can report
pub const MAX_TICK: Tick = 887_272;

/// Errors raised by a venue while pricing or executing a swap
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Swap failed: unknown venue {0}")]
    UnknownVenue(VenueId),

    #[error("Swap failed: pool already exists for {0}")]
    PoolExists(VenueId),

    #[error("Swap failed: invalid amount {0}")]
    InvalidAmount(Decimal),

    #[error("Swap failed: insufficient liquidity on {0}")]
    InsufficientLiquidity(VenueId),

    #[error("Swap failed: price limit {limit} exceeded, swap would reach tick {reached}")]
    PriceLimitExceeded { limit: Tick, reached: Tick },

    #[error("Swap failed: {0}")]
    Rejected(String),
}

/// Worst price a swap may push the venue to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriceLimit {
    /// Accept whatever price the market gives
    Unbounded,
    /// Reject the swap if it would move the venue past this tick
    Tick(Tick),
}

/// An AMM the engine can observe and trade against
pub trait Exchange {
    /// Snapshot of one venue's state, used to unwind a failed call
    type Checkpoint;

    /// Current price point of the venue
    fn current_tick(&self, venue: &VenueId) -> Result<Tick, SwapError>;

    /// Sell `amount_in` of `direction`'s input asset and return the output received
    fn swap(
        &mut self,
        venue: &VenueId,
        direction: Direction,
        amount_in: Decimal,
        limit: PriceLimit,
    ) -> Result<Decimal, SwapError>;

    fn checkpoint(&self, venue: &VenueId) -> Self::Checkpoint;

    fn restore(&mut self, venue: &VenueId, checkpoint: Self::Checkpoint);
}

/// Tick for a token1-per-token0 price: floor(log base 1.0001 of price)
pub fn tick_at_price(price: Decimal) -> Option<Tick> {
    let ratio = price.to_f64()?;
    if ratio <= 0.0 || !ratio.is_finite() {
        return None;
    }
    let tick = (ratio.ln() / 1.0001_f64.ln()).floor();
    Some((tick as i64).clamp(MIN_TICK as i64, MAX_TICK as i64) as Tick)
}

/// Constant-product (x * y = k) pool without fees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConstantProductPool {
    pub reserve0: Decimal,
    pub reserve1: Decimal,
}

impl ConstantProductPool {
    pub fn new(reserve0: Decimal, reserve1: Decimal) -> Self {
        Self { reserve0, reserve1 }
    }

    /// Price of token0 in token1
    pub fn price(&self) -> Option<Decimal> {
        self.reserve1.checked_div(self.reserve0)
    }

    pub fn tick(&self) -> Option<Tick> {
        self.price().and_then(tick_at_price)
    }

    /// Output amount and post-swap reserves, without mutating the pool
    fn quote(&self, direction: Direction, amount_in: Decimal) -> Option<(Decimal, ConstantProductPool)> {
        let (reserve_in, reserve_out) = match direction {
            Direction::ZeroForOne => (self.reserve0, self.reserve1),
            Direction::OneForZero => (self.reserve1, self.reserve0),
        };

        let new_reserve_in = reserve_in.checked_add(amount_in)?;
        let amount_out = reserve_out.checked_mul(amount_in)?.checked_div(new_reserve_in)?;
        let new_reserve_out = reserve_out.checked_sub(amount_out)?;
        if new_reserve_out <= Decimal::ZERO {
            return None;
        }

        let pool = match direction {
            Direction::ZeroForOne => ConstantProductPool::new(new_reserve_in, new_reserve_out),
            Direction::OneForZero => ConstantProductPool::new(new_reserve_out, new_reserve_in),
        };
        Some((amount_out, pool))
    }
}

/// In-process venue hosting any number of constant-product pools
#[derive(Debug, Default)]
pub struct SimulatedExchange {
    pools: HashMap<VenueId, ConstantProductPool>,
}

impl SimulatedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_pool(
        &mut self,
        venue: VenueId,
        reserve0: Decimal,
        reserve1: Decimal,
    ) -> Result<Tick, SwapError> {
        if reserve0 <= Decimal::ZERO {
            return Err(SwapError::InvalidAmount(reserve0));
        }
        if reserve1 <= Decimal::ZERO {
            return Err(SwapError::InvalidAmount(reserve1));
        }
        if self.pools.contains_key(&venue) {
            return Err(SwapError::PoolExists(venue));
        }

        let pool = ConstantProductPool::new(reserve0, reserve1);
        let tick = pool
            .tick()
            .ok_or_else(|| SwapError::InsufficientLiquidity(venue.clone()))?;
        self.pools.insert(venue, pool);
        Ok(tick)
    }

    pub fn pool(&self, venue: &VenueId) -> Option<&ConstantProductPool> {
        self.pools.get(venue)
    }
}

impl Exchange for SimulatedExchange {
    type Checkpoint = Option<ConstantProductPool>;

    fn current_tick(&self, venue: &VenueId) -> Result<Tick, SwapError> {
        let pool = self
            .pools
            .get(venue)
            .ok_or_else(|| SwapError::UnknownVenue(venue.clone()))?;
        pool.tick()
            .ok_or_else(|| SwapError::InsufficientLiquidity(venue.clone()))
    }

    fn swap(
        &mut self,
        venue: &VenueId,
        direction: Direction,
        amount_in: Decimal,
        limit: PriceLimit,
    ) -> Result<Decimal, SwapError> {
        if amount_in <= Decimal::ZERO {
            return Err(SwapError::InvalidAmount(amount_in));
        }

        let pool = self
            .pools
            .get_mut(venue)
            .ok_or_else(|| SwapError::UnknownVenue(venue.clone()))?;

        let (amount_out, next) = pool
            .quote(direction, amount_in)
            .ok_or_else(|| SwapError::InsufficientLiquidity(venue.clone()))?;
        let reached = next
            .tick()
            .ok_or_else(|| SwapError::InsufficientLiquidity(venue.clone()))?;

        if let PriceLimit::Tick(limit) = limit {
            let breached = match direction {
                Direction::ZeroForOne => reached < limit,
                Direction::OneForZero => reached > limit,
            };
            if breached {
                return Err(SwapError::PriceLimitExceeded { limit, reached });
            }
        }

        *pool = next;
        Ok(amount_out)
    }

    fn checkpoint(&self, venue: &VenueId) -> Self::Checkpoint {
        self.pools.get(venue).cloned()
    }

    fn restore(&mut self, venue: &VenueId, checkpoint: Self::Checkpoint) {
        match checkpoint {
            Some(pool) => {
                self.pools.insert(venue.clone(), pool);
            }
            None => {
                self.pools.remove(venue);
            }
        }
    }
}
