//! Sheetcast gateway binary.
//!
//! Serves the WebSocket endpoint that clients subscribe through. With Redis
//! configured it also relays every realtime channel from Redis into the
//! local rooms, so messages published by any mutation node reach the
//! clients connected here. Mutation nodes embed the library and build their
//! dispatcher with [`sheetcast::application::realtime_core`].

use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sheetcast::adapters::pubsub::RedisRoomRelay;
use sheetcast::adapters::websocket::{websocket_router, RoomManager, WebSocketState};
use sheetcast::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config);

    let rooms = Arc::new(RoomManager::new(config.realtime.room_capacity));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let relay_task = match &config.redis {
        Some(redis) => {
            let relay = RedisRoomRelay::new(&redis.url, rooms.clone())?
                .with_connect_timeout(redis.timeout());
            let relay_shutdown = shutdown_rx.clone();
            tracing::info!("Relaying realtime channels from Redis");
            Some(tokio::spawn(async move { relay.run(relay_shutdown).await }))
        }
        None => {
            tracing::info!("No Redis configured, serving in-process rooms only");
            None
        }
    };

    let app = websocket_router(WebSocketState::new(rooms, config.realtime.room_capacity))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Sheetcast listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown requested");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = relay_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Redis relay ended with error"),
            Err(e) => tracing::warn!(error = %e, "Redis relay panicked"),
        }
    }

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
