use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::messages::WsMessage;
use crate::models::ScanReport;

/// Topic-based pub/sub for engine events
#[derive(Clone)]
pub struct Broadcaster {
    /// Channel per topic (e.g. "fills:ETH-USDC", "orders:ETH-USDC")
    channels: Arc<DashMap<String, broadcast::Sender<WsMessage>>>,
    /// Buffered messages per channel
    capacity: usize,
}

impl Broadcaster {
    /// Create a new broadcaster with default capacity
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn get_or_create_channel(&self, topic: &str) -> broadcast::Sender<WsMessage> {
        self.channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<WsMessage> {
        self.get_or_create_channel(topic).subscribe()
    }

    /// Broadcast a message to a topic
    pub fn broadcast(&self, topic: &str, message: WsMessage) {
        if let Some(sender) = self.channels.get(topic) {
            // Ignore if no subscribers
            let _ = sender.send(message);
        }
    }

    pub fn broadcast_multi(&self, topics: &[String], message: WsMessage) {
        for topic in topics {
            self.broadcast(topic, message.clone());
        }
    }

    /// Fan out a fulfillment pass: each fill, then the pass summary
    pub fn publish_scan(&self, report: &ScanReport) {
        let fill_topics = [topics::fills(&report.venue), topics::all_fills().to_string()];
        for fill in &report.fills {
            self.broadcast_multi(&fill_topics, WsMessage::fill(fill));
        }
        self.broadcast(&topics::scans(&report.venue), WsMessage::scan(report));
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.channels
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Remove channels nobody listens to
    pub fn cleanup_empty_channels(&self) {
        self.channels.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper functions for topic naming
pub mod topics {
    use crate::models::VenueId;

    pub fn orders(venue: &VenueId) -> String {
        format!("orders:{}", venue)
    }

    pub fn fills(venue: &VenueId) -> String {
        format!("fills:{}", venue)
    }

    pub fn scans(venue: &VenueId) -> String {
        format!("scans:{}", venue)
    }

    pub fn swaps(venue: &VenueId) -> String {
        format!("swaps:{}", venue)
    }

    pub fn redemptions(venue: &VenueId) -> String {
        format!("redemptions:{}", venue)
    }

    pub fn all_fills() -> &'static str {
        "fills:*"
    }
}
