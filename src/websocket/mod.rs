pub mod broadcaster;
pub mod handler;
pub mod messages;

pub use broadcaster::{topics, Broadcaster};
pub use handler::{websocket_handler, WsState};
pub use messages::{ClientMessage, PositionLevel, WsMessage};
