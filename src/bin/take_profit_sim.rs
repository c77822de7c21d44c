use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use take_profit_engine::host::PriceLimit;
use take_profit_engine::models::Asset;
use take_profit_engine::websocket::{topics, WsMessage};
use take_profit_engine::{
    create_router, AppState, Broadcaster, Direction, EngineConfig, Exchange, ScanLatencyTracker,
    SimulatedEngine, TakeProfitError, VenueConfig, VenueId,
};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const VENUE: &str = "ETH-USDC";
const SPACING: i32 = 10;
const MAKERS: [&str; 3] = ["alice", "carol", "dave"];
const TRADER: &str = "bob";
const STATS_EVERY: u64 = 20;

/// One simulation step: a maker rests a take-profit order near the price,
/// then the trader pushes the price a random distance either way
fn step(state: &AppState) -> Result<(), TakeProfitError> {
    let venue = VenueId::new(VENUE);
    let mut rng = rand::rng();

    let maker = MAKERS[rng.random_range(0..MAKERS.len())];
    let direction = if rng.random_bool(0.5) {
        Direction::ZeroForOne
    } else {
        Direction::OneForZero
    };
    let amount = Decimal::from(rng.random_range(10..500));
    let swap_direction = if rng.random_bool(0.5) {
        Direction::ZeroForOne
    } else {
        Direction::OneForZero
    };
    let swap_amount = Decimal::from(rng.random_range(1_000..20_000));
    let offset = rng.random_range(1..40) * SPACING;

    let mut engine = state.engine.lock();
    engine.venue_config(&venue)?;
    let current = engine.exchange().current_tick(&venue)?;
    // Sellers of token0 wait for a higher price, sellers of token1 for a lower one
    let target = match direction {
        Direction::ZeroForOne => current + offset,
        Direction::OneForZero => current - offset,
    };

    let placed = engine.place_order(maker, &venue, target, direction, amount)?;
    let started = Instant::now();
    let trade = engine.execute_swap(TRADER, &venue, swap_direction, swap_amount, PriceLimit::Unbounded)?;
    let elapsed = started.elapsed();
    drop(engine);

    state.broadcaster.broadcast(&topics::orders(&venue), WsMessage::placed(&placed));
    state
        .broadcaster
        .broadcast(&topics::swaps(&venue), WsMessage::swap(&venue, swap_direction, &trade));
    state.broadcaster.publish_scan(&trade.scan);

    state.scan_metrics.lock().record_pass(&trade.scan, elapsed);
    Ok(())
}

fn seed(engine: &mut SimulatedEngine) -> Result<(), TakeProfitError> {
    let venue = VenueId::new(VENUE);
    engine
        .exchange_mut()
        .create_pool(venue.clone(), dec!(1000000), dec!(1000000))?;
    engine.register_venue(venue.clone(), VenueConfig::new(SPACING))?;

    for maker in MAKERS {
        engine.custody_mut().deposit(maker, &venue, Asset::Token0, dec!(1000000))?;
        engine.custody_mut().deposit(maker, &venue, Asset::Token1, dec!(1000000))?;
    }
    engine.custody_mut().deposit(TRADER, &venue, Asset::Token0, dec!(100000000))?;
    engine.custody_mut().deposit(TRADER, &venue, Asset::Token1, dec!(100000000))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "take_profit_engine=info,take_profit_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("🚀 Starting take-profit simulator\n");

    let mut engine = SimulatedEngine::simulated(EngineConfig::default());
    seed(&mut engine)?;

    let state = AppState::new(engine, Broadcaster::new(), ScanLatencyTracker::new()?);
    let app = create_router(state.clone());

    let generator = tokio::spawn(async move {
        for iteration in 1u64.. {
            if let Err(e) = step(&state) {
                tracing::warn!(error = %e, "Simulation step rejected");
            }
            if iteration % STATS_EVERY == 0 {
                let stats = state.scan_metrics.lock().stats();
                tracing::info!(
                    passes = stats.passes,
                    fills = stats.total_fills,
                    p50_us = stats.p50_us(),
                    p99_us = stats.p99_us(),
                    "Scan pass statistics"
                );
            }
            sleep(Duration::from_millis(500)).await;
        }
    });

    let addr = "127.0.0.1:3000";
    let listener = tokio::net::TcpListener::bind(addr).await?;

    println!("✅ Simulator ready");
    println!("🌐 HTTP Server:    http://{}", addr);
    println!("📚 Swagger UI:     http://{}/swagger-ui", addr);
    println!("🔌 WebSocket:      ws://{}/ws", addr);
    println!("    {{\"action\": \"subscribe\", \"channel\": \"fills\"}}\n");

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::select! {
        _ = generator => println!("Generator stopped"),
        result = server => {
            result??;
            println!("Server stopped");
        }
    }
    Ok(())
}
