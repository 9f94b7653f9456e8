//! Integration tests for the HTTP surface.
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`:
//! 1. Health endpoint is public
//! 2. Bearer middleware rejects bad tokens and injects identity
//! 3. The per-IP rate limiter returns 429 with retry headers

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use mortrack::adapters::auth::MockTokenVerifier;
use mortrack::adapters::http::{build_router, middleware::FixedWindowLimiter, timeout_layer, AppState};
use mortrack::adapters::websocket::{ConnectionRegistry, Relay};
use mortrack::config::{RealtimeConfig, ServerConfig, MAX_BODY_BYTES};
use mortrack::domain::foundation::Role;
use mortrack::ports::TokenVerifier;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn test_app(limiter: FixedWindowLimiter) -> axum::Router {
    let verifier: Arc<dyn TokenVerifier> = Arc::new(
        MockTokenVerifier::new().with_user("staff-token", "staff-1", Role::Staff),
    );
    let relay = Arc::new(Relay::new(
        Arc::new(ConnectionRegistry::new()),
        verifier.clone(),
        RealtimeConfig::default(),
    ));
    let state = AppState {
        relay,
        verifier,
        limiter: Arc::new(limiter),
    };
    build_router(state, &ServerConfig::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Forwarded-For", "203.0.113.9")
        .body(Body::empty())
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Forwarded-For", "203.0.113.9")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_is_public_and_reports_ok() {
    let app = test_app(FixedWindowLimiter::with_defaults());

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn health_answers_despite_invalid_bearer_token() {
    let app = test_app(FixedWindowLimiter::with_defaults());

    let response = app
        .oneshot(get_with_token("/api/health", "forged"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn me_requires_authentication() {
    let app = test_app(FixedWindowLimiter::with_defaults());

    let response = app.oneshot(get("/api/me")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn me_rejects_invalid_token() {
    let app = test_app(FixedWindowLimiter::with_defaults());

    let response = app
        .oneshot(get_with_token("/api/me", "forged"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn me_returns_verified_identity() {
    let app = test_app(FixedWindowLimiter::with_defaults());

    let response = app
        .oneshot(get_with_token("/api/me", "staff-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["userId"], "staff-1");
    assert_eq!(body["role"], "staff");
}

// =============================================================================
// Rate limiting
// =============================================================================

#[tokio::test]
async fn rate_limiter_returns_429_when_budget_exhausted() {
    let app = test_app(FixedWindowLimiter::new(2, Duration::from_secs(900)));

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-ratelimit-remaining"));
    }

    let response = app.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));

    let body = body_json(response).await;
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn rate_limiter_keys_on_client_ip() {
    let app = test_app(FixedWindowLimiter::new(1, Duration::from_secs(900)));

    let response = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same IP is out of budget
    let response = app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different IP still has its own budget
    let request = Request::builder()
        .uri("/api/health")
        .header("X-Forwarded-For", "198.51.100.7")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Request limits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn slow_requests_hit_the_configured_timeout() {
    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    }

    let config = ServerConfig {
        request_timeout_secs: 1,
        ..Default::default()
    };
    let app = axum::Router::new()
        .route("/slow", axum::routing::get(slow))
        .layer(timeout_layer(&config));

    let response = app.oneshot(get("/slow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn oversized_request_bodies_are_rejected() {
    async fn echo(body: axum::body::Bytes) -> String {
        body.len().to_string()
    }

    let app = axum::Router::new()
        .route("/echo", axum::routing::post(echo))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from(vec![0u8; MAX_BODY_BYTES + 1]))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from(vec![0u8; 1024]))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn websocket_route_is_outside_the_api_rate_limit() {
    let app = test_app(FixedWindowLimiter::new(1, Duration::from_secs(900)));

    // Burn the budget on the API side
    app.clone().oneshot(get("/api/health")).await.unwrap();

    // A plain GET to /ws is not a valid upgrade, but it must not be 429
    let response = app.oneshot(get("/ws")).await.unwrap();
    assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
