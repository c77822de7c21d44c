use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::venue::{normalize_tick, Direction, Tick, VenueId};

/// Identity of a pooled take-profit order
///
/// The key is the (venue, boundary, direction) triple itself, so two distinct
/// triples can never collide and every depositor at the same triple shares one
/// identity. The same value keys the outstanding position in the order book.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct OrderId {
    pub venue: VenueId,
    pub boundary: Tick,
    pub direction: Direction,
}

impl OrderId {
    /// Build an identity from an already-normalized boundary
    pub fn new(venue: VenueId, boundary: Tick, direction: Direction) -> Self {
        Self {
            venue,
            boundary,
            direction,
        }
    }

    /// Identity for a raw target tick, normalized against `spacing`
    pub fn for_target(venue: &VenueId, target_tick: Tick, spacing: Tick, direction: Direction) -> Self {
        Self::new(venue.clone(), normalize_tick(target_tick, spacing), direction)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.venue, self.boundary, self.direction)
    }
}
