//! Mock authentication adapter for testing.
//!
//! Implements the `TokenVerifier` port without a real credential layer:
//! a token maps to a user, anything else is rejected.
//!
//! # Example
//!
//! ```ignore
//! use mortrack::adapters::auth::MockTokenVerifier;
//! use mortrack::domain::foundation::Role;
//!
//! let verifier = MockTokenVerifier::new().with_user("staff-token", "u1", Role::Staff);
//! let user = verifier.verify("staff-token").await.unwrap();
//! assert_eq!(user.id.as_str(), "u1");
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};
use crate::ports::TokenVerifier;

/// Mock token verifier for testing.
///
/// Stores a map of tokens to users. Tokens not in the map return
/// `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockTokenVerifier {
    /// Map of valid tokens to their associated users
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Optional error to return for all verifications (for error testing)
    force_error: RwLock<Option<AuthError>>,
}

impl MockTokenVerifier {
    /// Creates a new empty mock verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to a user with the given id and role.
    pub fn with_user(
        self,
        token: impl Into<String>,
        user_id: impl Into<String>,
        role: Role,
    ) -> Self {
        let user_id = user_id.into();
        let user = AuthenticatedUser::new(
            UserId::new(&user_id).expect("test user id must be non-empty"),
            role,
            Some(format!("Test User {user_id}")),
        );
        self.tokens.write().unwrap().insert(token.into(), user);
        self
    }

    /// Forces all verifications to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap() = Some(error);
        self
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self.force_error.read().unwrap().clone() {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_returns_user() {
        let verifier = MockTokenVerifier::new().with_user("tok", "u1", Role::Admin);
        let user = verifier.verify("tok").await.unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let verifier = MockTokenVerifier::new();
        assert!(matches!(
            verifier.verify("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn forced_error_is_returned() {
        let verifier = MockTokenVerifier::new()
            .with_user("tok", "u1", Role::Staff)
            .with_error(AuthError::ServiceUnavailable("down".into()));

        assert!(matches!(
            verifier.verify("tok").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
    }
}
