//! HTTP surface: router assembly, health endpoint and middleware.
//!
//! The REST contract pieces live here: `GET /api/health`, bearer-token
//! authentication, per-IP rate limiting, the 10 MB JSON body limit, and
//! the WebSocket upgrade route for the relay.

pub mod health;
pub mod me;
pub mod middleware;

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{ServerConfig, MAX_BODY_BYTES};
use crate::ports::TokenVerifier;

use crate::adapters::websocket::{ws_handler, Relay, RelayState};

use self::health::health_handler;
use self::me::me_handler;
use self::middleware::{auth_middleware, rate_limit_middleware, FixedWindowLimiter};

/// Shared application state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    /// The real-time relay.
    pub relay: Arc<Relay>,
    /// Token verifier shared with the relay handshake.
    pub verifier: Arc<dyn TokenVerifier>,
    /// Per-IP request limiter for `/api/*`.
    pub limiter: Arc<FixedWindowLimiter>,
}

impl FromRef<AppState> for RelayState {
    fn from_ref(state: &AppState) -> Self {
        RelayState::new(state.relay.clone())
    }
}

/// Build the application router.
///
/// All `/api/*` routes carry the rate limiter; only the protected routes
/// carry the bearer-auth middleware, so `/api/health` answers regardless
/// of what the `Authorization` header holds. The `/ws` upgrade is outside
/// both, since relay connections authenticate in-band and are not
/// request/response shaped.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let protected = Router::new()
        .route("/me", get(me_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.verifier.clone(),
            auth_middleware,
        ));

    let api = Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(axum_middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(timeout_layer(config))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .with_state(state)
}

/// Request timeout for the HTTP surface, from configuration.
pub fn timeout_layer(config: &ServerConfig) -> TimeoutLayer {
    TimeoutLayer::new(config.request_timeout())
}

/// CORS policy: explicit origins when configured, permissive otherwise
/// (development convenience).
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse::<http::HeaderValue>().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockTokenVerifier;
    use crate::adapters::websocket::ConnectionRegistry;
    use crate::config::RealtimeConfig;

    fn test_state() -> AppState {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(MockTokenVerifier::new());
        AppState {
            relay: Arc::new(Relay::new(
                Arc::new(ConnectionRegistry::new()),
                verifier.clone(),
                RealtimeConfig::default(),
            )),
            verifier,
            limiter: Arc::new(FixedWindowLimiter::with_defaults()),
        }
    }

    #[test]
    fn router_builds_without_panic() {
        let _router = build_router(test_state(), &ServerConfig::default());
    }

    #[test]
    fn cors_layer_accepts_configured_origins() {
        let config = ServerConfig {
            cors_origins: Some("http://localhost:5173".to_string()),
            ..Default::default()
        };
        let _layer = cors_layer(&config);
    }
}
