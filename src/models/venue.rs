use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// A price point on a venue's tick scale
pub type Tick = i32;

/// Opaque identifier of one trading instance (one pool)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VenueId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One of the two assets a venue trades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Token0,
    Token1,
}

/// Which asset is being sold
///
/// `ZeroForOne` sells token0 for token1 and pushes the venue's price down;
/// `OneForZero` sells token1 for token0 and pushes it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    ZeroForOne,
    OneForZero,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::ZeroForOne => Direction::OneForZero,
            Direction::OneForZero => Direction::ZeroForOne,
        }
    }

    /// The asset a depositor hands over
    pub fn input_asset(self) -> Asset {
        match self {
            Direction::ZeroForOne => Asset::Token0,
            Direction::OneForZero => Asset::Token1,
        }
    }

    /// The asset a fill acquires
    pub fn output_asset(self) -> Asset {
        match self {
            Direction::ZeroForOne => Asset::Token1,
            Direction::OneForZero => Asset::Token0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ZeroForOne => f.write_str("zero_for_one"),
            Direction::OneForZero => f.write_str("one_for_zero"),
        }
    }
}

/// Static per-venue settings fixed at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VenueConfig {
    /// Distance between valid boundaries, always positive
    pub tick_spacing: Tick,
}

impl VenueConfig {
    pub fn new(tick_spacing: Tick) -> Self {
        Self { tick_spacing }
    }

    pub fn boundary_of(&self, tick: Tick) -> Tick {
        normalize_tick(tick, self.tick_spacing)
    }
}

/// Floor a raw tick to the nearest multiple of `spacing` toward negative infinity
///
/// Integer division truncates toward zero, so a negative tick that does not
/// divide evenly needs its quotient stepped down once before multiplying back.
///
/// `spacing` must be positive; callers validate it when the venue is registered.
pub fn normalize_tick(tick: Tick, spacing: Tick) -> Tick {
    let mut quotient = tick / spacing;
    if tick < 0 && tick % spacing != 0 {
        quotient -= 1;
    }
    quotient * spacing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_positive_ticks() {
        assert_eq!(normalize_tick(0, 10), 0);
        assert_eq!(normalize_tick(5, 10), 0);
        assert_eq!(normalize_tick(105, 10), 100);
        assert_eq!(normalize_tick(120, 10), 120);
        assert_eq!(normalize_tick(6931, 60), 6900);
    }

    #[test]
    fn test_normalize_negative_ticks_floor_toward_negative_infinity() {
        assert_eq!(normalize_tick(-5, 10), -10);
        assert_eq!(normalize_tick(-10, 10), -10);
        assert_eq!(normalize_tick(-11, 10), -20);
        assert_eq!(normalize_tick(-1, 60), -60);
    }

    #[test]
    fn test_direction_assets() {
        assert_eq!(Direction::ZeroForOne.input_asset(), Asset::Token0);
        assert_eq!(Direction::ZeroForOne.output_asset(), Asset::Token1);
        assert_eq!(Direction::OneForZero.input_asset(), Asset::Token1);
        assert_eq!(Direction::OneForZero.opposite(), Direction::ZeroForOne);
    }

    #[test]
    fn test_direction_serde_names() {
        let json = serde_json::to_string(&Direction::ZeroForOne).unwrap();
        assert_eq!(json, "\"zero_for_one\"");

        let parsed: Direction = serde_json::from_str("\"one_for_zero\"").unwrap();
        assert_eq!(parsed, Direction::OneForZero);
    }
}
