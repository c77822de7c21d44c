use rust_decimal_macros::dec;
use take_profit_engine::{
    create_router, AppConfig, AppState, Broadcaster, ScanLatencyTracker, SimulatedEngine,
    TakeProfitError, VenueConfig, VenueId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_VENUE: &str = "ETH-USDC";
const DEMO_SPACING: i32 = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "take_profit_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let mut engine = SimulatedEngine::simulated(config.engine.clone());
    tracing::info!(
        max_fills_per_pass = engine.config().max_fills_per_pass,
        broadcast_capacity = config.broadcast_capacity,
        "Configuration loaded"
    );

    if config.seed_demo_venue {
        seed_demo_venue(&mut engine)?;
    }

    let state = AppState::new(
        engine,
        Broadcaster::with_capacity(config.broadcast_capacity),
        ScanLatencyTracker::new()?,
    );
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 Take-profit engine running on http://{}", addr);
    tracing::info!("📊 Health check: http://{}/health", addr);
    tracing::info!("📚 Swagger UI: http://{}/swagger-ui", addr);
    tracing::info!("🔌 WebSocket: ws://{}/ws", addr);
    tracing::info!("");
    tracing::info!("📡 WebSocket Subscription Examples:");
    tracing::info!(r#"   {{"action":"subscribe","channel":"fills","venue":"{}"}}"#, DEMO_VENUE);
    tracing::info!(r#"   {{"action":"subscribe","channel":"orders","venue":"{}"}}"#, DEMO_VENUE);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Balanced pool at tick 0 so orders can be placed right away
fn seed_demo_venue(engine: &mut SimulatedEngine) -> Result<(), TakeProfitError> {
    let venue = VenueId::new(DEMO_VENUE);
    engine
        .exchange_mut()
        .create_pool(venue.clone(), dec!(1000000), dec!(1000000))?;
    let boundary = engine.register_venue(venue.clone(), VenueConfig::new(DEMO_SPACING))?;

    tracing::info!(%venue, boundary, spacing = DEMO_SPACING, "Demo venue seeded");
    Ok(())
}
