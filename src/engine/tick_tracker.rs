use std::collections::HashMap;

use crate::models::{Tick, VenueId};

/// Last boundary each venue was observed at after a fulfillment pass
#[derive(Debug, Default)]
pub struct TickTracker {
    last: HashMap<VenueId, Tick>,
}

impl TickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, venue: &VenueId) -> Option<Tick> {
        self.last.get(venue).copied()
    }

    /// Store a boundary, returning whatever was there before
    pub fn record(&mut self, venue: &VenueId, boundary: Tick) -> Option<Tick> {
        self.last.insert(venue.clone(), boundary)
    }

    pub(crate) fn restore(&mut self, venue: &VenueId, previous: Option<Tick>) {
        match previous {
            Some(boundary) => {
                self.last.insert(venue.clone(), boundary);
            }
            None => {
                self.last.remove(venue);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_restore() {
        let venue = VenueId::new("ETH-USDC");
        let mut tracker = TickTracker::new();

        assert_eq!(tracker.record(&venue, 90), None);
        assert_eq!(tracker.record(&venue, 120), Some(90));

        tracker.restore(&venue, Some(90));
        assert_eq!(tracker.get(&venue), Some(90));

        tracker.restore(&venue, None);
        assert_eq!(tracker.get(&venue), None);
    }
}
