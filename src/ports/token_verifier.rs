//! Token verification port.
//!
//! This port defines the contract for validating bearer tokens and
//! extracting user identity. It is provider-agnostic; the production
//! adapter verifies HS256 JWTs, tests use a mock.
//!
//! Both surfaces go through this seam: the HTTP middleware validates the
//! `Authorization` header with it, and the relay validates the token
//! carried by the in-band `authenticate` message. The relay never trusts
//! a client-asserted identity.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates bearer tokens and extracts user identity.
///
/// # Contract
///
/// Implementations must:
/// - Validate the token signature
/// - Validate expiry (and issuer when configured)
/// - Return `AuthError::InvalidToken` for malformed/bad-signature tokens
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::InvalidClaims` when identity claims are unusable
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Validate a bearer token and return the authenticated user.
    ///
    /// `token` is the raw token, without the `Bearer ` prefix.
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
