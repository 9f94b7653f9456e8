//! Current-user endpoint.

use axum::Json;
use serde::Serialize;

use crate::domain::foundation::Role;

use super::middleware::RequireAuth;

/// Identity of the caller as seen by the backend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// `GET /api/me` - echo the verified identity behind the bearer token.
pub async fn me_handler(RequireAuth(user): RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.id.to_string(),
        role: user.role,
        display_name: user.display_name,
    })
}
