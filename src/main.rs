//! Mortrack backend entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mortrack::adapters::auth::JwtTokenVerifier;
use mortrack::adapters::http::{build_router, middleware::FixedWindowLimiter, AppState};
use mortrack::adapters::websocket::{ConnectionRegistry, Relay};
use mortrack::config::AppConfig;
use mortrack::ports::TokenVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if config.server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtTokenVerifier::new((&config.auth).into()));

    let registry = Arc::new(ConnectionRegistry::new());
    let relay = Arc::new(Relay::new(
        registry,
        verifier.clone(),
        config.realtime.clone(),
    ));

    // Heartbeat runs for the life of the process
    relay.clone().spawn_heartbeat();

    let limiter = Arc::new(FixedWindowLimiter::new(
        config.server.rate_limit_max_requests,
        Duration::from_secs(config.server.rate_limit_window_secs),
    ));

    let state = AppState {
        relay,
        verifier,
        limiter,
    };
    let app = build_router(state, &config.server);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "Starting mortrack backend");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
