use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::SplitSink, stream::StreamExt};
use std::sync::Arc;
use tokio::select;
use tokio::time::{interval, Duration};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamMap;
use tracing::{error, info, warn};

use super::{
    broadcaster::{topics, Broadcaster},
    messages::{ClientMessage, PositionLevel, WsMessage},
};
use crate::engine::SharedEngine;
use crate::models::VenueId;

/// WebSocket connection state
pub struct WsState {
    pub broadcaster: Broadcaster,
    pub engine: SharedEngine,
}

type Subscriptions = StreamMap<String, BroadcastStream<WsMessage>>;

/// Handle WebSocket upgrade request
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut subscriptions: Subscriptions = StreamMap::new();
    let mut heartbeat = interval(Duration::from_secs(30));

    info!("WebSocket client connected");

    loop {
        select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_client_message(&text, &mut subscriptions, &mut sender, &state).await {
                            error!("Error handling client message: {}", e);
                            let reply = WsMessage::Error { message: e.to_string() };
                            if send_json(&mut sender, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }

            Some((topic, event)) = subscriptions.next(), if !subscriptions.is_empty() => {
                match event {
                    Ok(ws_msg) => {
                        if send_json(&mut sender, &ws_msg).await.is_err() {
                            break;
                        }
                    }
                    Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                        warn!(%topic, skipped, "WebSocket subscriber lagged behind");
                    }
                }
            }

            _ = heartbeat.tick() => {
                let ping = WsMessage::Ping { timestamp: chrono::Utc::now() };
                if send_json(&mut sender, &ping).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(subscriptions);
    state.broadcaster.cleanup_empty_channels();
    info!("WebSocket connection closed");
}

async fn handle_client_message(
    text: &str,
    subscriptions: &mut Subscriptions,
    sender: &mut SplitSink<WebSocket, Message>,
    state: &Arc<WsState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let client_msg: ClientMessage = serde_json::from_str(text)?;

    match client_msg {
        ClientMessage::Subscribe { channel, venue } => {
            let topic = build_topic(&channel, venue.as_deref())?;
            let rx = state.broadcaster.subscribe(&topic);
            subscriptions.insert(topic.clone(), BroadcastStream::new(rx));

            send_json(sender, &WsMessage::Subscribed { channel: channel.clone(), venue: venue.clone() }).await?;

            if channel == "orders" {
                if let Some(venue) = &venue {
                    let snapshot = positions_snapshot(&VenueId::new(venue.as_str()), &state.engine);
                    send_json(sender, &snapshot).await?;
                }
            }

            info!(%topic, subscribers = state.broadcaster.subscriber_count(&topic), "Client subscribed");
        }
        ClientMessage::Unsubscribe { channel, venue } => {
            let topic = build_topic(&channel, venue.as_deref())?;
            subscriptions.remove(&topic);

            send_json(sender, &WsMessage::Unsubscribed { channel, venue }).await?;
            info!("Client unsubscribed from: {}", topic);
        }
        ClientMessage::Ping => {
            send_json(sender, &WsMessage::Pong { timestamp: chrono::Utc::now() }).await?;
        }
    }

    Ok(())
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &WsMessage,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let json = serde_json::to_string(message)?;
    sender.send(Message::Text(json)).await?;
    Ok(())
}

/// Build topic string from channel and venue
fn build_topic(channel: &str, venue: Option<&str>) -> Result<String, String> {
    let venue = venue.map(VenueId::new);
    match (channel, venue) {
        ("fills", None) => Ok(topics::all_fills().to_string()),
        ("fills", Some(venue)) => Ok(topics::fills(&venue)),
        ("orders", Some(venue)) => Ok(topics::orders(&venue)),
        ("scans", Some(venue)) => Ok(topics::scans(&venue)),
        ("swaps", Some(venue)) => Ok(topics::swaps(&venue)),
        ("redemptions", Some(venue)) => Ok(topics::redemptions(&venue)),
        ("orders" | "scans" | "swaps" | "redemptions", None) => {
            Err(format!("{} channel requires venue", channel))
        }
        _ => Err(format!("Unknown channel: {}", channel)),
    }
}

fn positions_snapshot(venue: &VenueId, engine: &SharedEngine) -> WsMessage {
    let engine = engine.lock();
    let positions = engine
        .positions(venue)
        .into_iter()
        .filter(|(_, outstanding)| !outstanding.is_zero())
        .map(|(order_id, outstanding)| PositionLevel {
            boundary: order_id.boundary,
            direction: order_id.direction,
            outstanding,
        })
        .collect();

    WsMessage::PositionsSnapshot {
        venue: venue.clone(),
        last_boundary: engine.last_boundary(venue),
        positions,
        timestamp: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_topic() {
        assert_eq!(build_topic("fills", None).unwrap(), "fills:*");
        assert_eq!(build_topic("fills", Some("ETH-USDC")).unwrap(), "fills:ETH-USDC");
        assert_eq!(build_topic("orders", Some("ETH-USDC")).unwrap(), "orders:ETH-USDC");
        assert!(build_topic("orders", None).is_err());
        assert!(build_topic("candles", Some("ETH-USDC")).is_err());
    }
}
