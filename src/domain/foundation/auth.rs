//! Authentication types for the domain layer.
//!
//! These types represent an authenticated user extracted from a verified
//! bearer token. They have no provider dependencies; any token verifier
//! can populate them via the `TokenVerifier` port. The same type is used
//! on both surfaces: injected into HTTP request extensions by the auth
//! middleware, and attached to relay connections after the in-band
//! `authenticate` handshake.

use thiserror::Error;

use super::{Role, UserId};

/// Authenticated user extracted from a validated token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the credential layer.
    pub id: UserId,

    /// Role carried in the token claims.
    pub role: Role,

    /// Display name if available.
    pub display_name: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user.
    ///
    /// Typically called by a `TokenVerifier` adapter after successfully
    /// validating a token.
    pub fn new(id: UserId, role: Role, display_name: Option<String>) -> Self {
        Self {
            id,
            role,
            display_name,
        }
    }

    /// Returns the display name, or the user id as fallback.
    pub fn display_name_or_id(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Authentication errors that can occur during token validation.
///
/// These errors are domain-centric; they describe what went wrong from the
/// application's perspective, not the token library's.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// Token is valid but carries no usable identity claims.
    #[error("Token has invalid claims: {0}")]
    InvalidClaims(String),

    /// The verification backend is unavailable.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates an invalid claims error with a reason.
    pub fn invalid_claims(reason: impl Into<String>) -> Self {
        Self::InvalidClaims(reason.into())
    }
}
