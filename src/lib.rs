// Library crate root
//
// main.rs and the simulator binary import through lib.rs like an external crate
pub mod api;
pub mod config;
pub mod engine;
pub mod host;
pub mod metrics;
pub mod models;
pub mod websocket;

pub use api::{create_router, AppState};
pub use config::{AppConfig, EngineConfig};
pub use engine::{SharedEngine, SimulatedEngine, TakeProfitEngine, TakeProfitError};
pub use host::{Custody, Exchange, Ledger, SimulatedExchange};
pub use metrics::ScanLatencyTracker;
pub use models::{Direction, OrderId, ScanReport, Tick, VenueConfig, VenueId};
pub use websocket::Broadcaster;
