//! Rate limiting middleware for axum.
//!
//! A fixed-window in-memory limiter keyed by client IP, applied to all
//! `/api/*` routes. Defaults match the REST contract: 100 requests per
//! 15-minute window per IP.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `Retry-After`: Seconds to wait (only on 429 response)

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Rate limiter middleware state.
pub type RateLimiterState = Arc<FixedWindowLimiter>;

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    /// Maximum requests allowed in the window.
    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    /// Requests remaining in the current window.
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request allowed; `remaining` requests left in this window.
    Allowed { remaining: u32 },
    /// Request denied until the window resets.
    Denied { retry_after_secs: u64 },
}

struct Window {
    started_at: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by an opaque client key.
///
/// Counters reset at window boundaries; stale windows are replaced lazily
/// on the next check for that key.
pub struct FixedWindowLimiter {
    windows: Mutex<HashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    /// Creates a limiter with the given per-window budget.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Creates a limiter with the REST contract defaults
    /// (100 requests per 15 minutes).
    pub fn with_defaults() -> Self {
        Self::new(100, Duration::from_secs(900))
    }

    /// Maximum requests allowed per window.
    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    /// Counts a request against `key` and decides whether to allow it.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap();

        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });

        if now.duration_since(window.started_at) >= self.window {
            window.started_at = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let elapsed = now.duration_since(window.started_at);
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs().max(1);
            return RateLimitDecision::Denied { retry_after_secs };
        }

        window.count += 1;
        RateLimitDecision::Allowed {
            remaining: self.max_requests - window.count,
        }
    }
}

/// Rate limiting middleware keyed by client IP.
///
/// Requests without a resolvable client IP share one bucket, so a
/// misconfigured proxy degrades to a global limit instead of a bypass.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = extract_client_ip(&request, connect_info.as_ref());
    let key = client_ip.as_deref().unwrap_or("unknown");

    match limiter.check(key) {
        RateLimitDecision::Denied { retry_after_secs } => {
            rate_limit_response(limiter.limit(), retry_after_secs)
        }
        RateLimitDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(&mut response, limiter.limit(), remaining);
            response
        }
    }
}

/// Extract client IP from request, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
fn extract_client_ip<B>(
    request: &axum::http::Request<B>,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
) -> Option<String> {
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first_ip) = forwarded.split(',').next() {
            return Some(first_ip.trim().to_string());
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return Some(real_ip.to_string());
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

/// Create a 429 Too Many Requests response.
fn rate_limit_response(limit: u32, retry_after_secs: u64) -> Response {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "Rate limit exceeded",
            "code": "RATE_LIMIT_EXCEEDED",
            "retry_after_secs": retry_after_secs
        })),
    )
        .into_response();

    add_rate_limit_headers(&mut response, limit, 0);
    if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
        response.headers_mut().insert("Retry-After", value);
    }

    response
}

/// Add rate limit headers to a response.
fn add_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert(headers::X_RATELIMIT_LIMIT.clone(), value);
    }
    if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert(headers::X_RATELIMIT_REMAINING.clone(), value);
    }
}
