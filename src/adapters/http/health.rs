//! Health check endpoint.

use axum::Json;
use serde::Serialize;

use crate::domain::foundation::Timestamp;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// `GET /api/health` - liveness probe, unauthenticated.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Timestamp::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health_handler().await;
        assert_eq!(body.status, "ok");
        assert!(!body.timestamp.is_empty());
    }

    #[tokio::test]
    async fn health_serializes_expected_fields() {
        let Json(body) = health_handler().await;
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["timestamp"].is_string());
    }
}
