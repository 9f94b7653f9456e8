//! HS256 JWT adapter for token verification.
//!
//! This adapter implements the `TokenVerifier` port for tokens signed with
//! a shared secret by the credential layer. It validates the signature and
//! expiry (plus issuer when configured) and maps claims to the domain
//! `AuthenticatedUser` type.
//!
//! The same verifier instance serves both the REST middleware and the
//! relay handshake, so a token accepted on one surface is accepted on the
//! other.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, UserId};
use crate::ports::TokenVerifier;

/// Configuration for the JWT verifier.
#[derive(Debug, Clone)]
pub struct JwtVerifierConfig {
    /// Shared HS256 secret.
    pub secret: String,

    /// Expected `iss` claim; issuer validation is skipped when `None`.
    pub issuer: Option<String>,

    /// Allowed clock skew for expiry validation, in seconds.
    pub leeway_secs: u64,
}

impl From<&AuthConfig> for JwtVerifierConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            issuer: config.issuer.clone(),
            leeway_secs: config.leeway_secs,
        }
    }
}

/// Claims carried by Mortrack access tokens.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Subject - the user id.
    sub: String,

    /// Role name (`admin`, `staff` or `pathologist`).
    role: String,

    /// Expiry timestamp (Unix epoch seconds). Read by the library during
    /// validation; kept here so missing-exp tokens fail deserialization.
    #[allow(dead_code)]
    exp: i64,

    /// User's display name.
    #[serde(default)]
    name: Option<String>,
}

/// `TokenVerifier` implementation over HS256 JWTs.
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Create a verifier from configuration.
    pub fn new(config: JwtVerifierConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let claims = data.claims;
        let id = UserId::new(claims.sub)
            .map_err(|_| AuthError::invalid_claims("empty subject claim"))?;
        let role: Role = claims
            .role
            .parse()
            .map_err(|_| AuthError::invalid_claims(format!("unknown role '{}'", claims.role)))?;

        Ok(AuthenticatedUser::new(id, role, claims.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const SECRET: &str = "test-secret";

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        role: String,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<String>,
    }

    fn sign(claims: &TestClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> JwtTokenVerifier {
        JwtTokenVerifier::new(JwtVerifierConfig {
            secret: SECRET.to_string(),
            issuer: None,
            leeway_secs: 0,
        })
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn verifies_valid_token() {
        let token = sign(&TestClaims {
            sub: "u1".to_string(),
            role: "staff".to_string(),
            exp: future_exp(),
            name: Some("Alice".to_string()),
            iss: None,
        });

        let user = verifier().verify(&token).await.unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role, Role::Staff);
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let token = sign(&TestClaims {
            sub: "u1".to_string(),
            role: "staff".to_string(),
            exp: chrono::Utc::now().timestamp() - 3600,
            name: None,
            iss: None,
        });

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn rejects_wrong_signature() {
        let token = encode(
            &Header::default(),
            &TestClaims {
                sub: "u1".to_string(),
                role: "staff".to_string(),
                exp: future_exp(),
                name: None,
                iss: None,
            },
            &EncodingKey::from_secret(b"another-secret"),
        )
        .unwrap();

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn rejects_unknown_role() {
        let token = sign(&TestClaims {
            sub: "u1".to_string(),
            role: "janitor".to_string(),
            exp: future_exp(),
            name: None,
            iss: None,
        });

        let err = verifier().verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims(_)));
    }

    #[tokio::test]
    async fn validates_issuer_when_configured() {
        let verifier = JwtTokenVerifier::new(JwtVerifierConfig {
            secret: SECRET.to_string(),
            issuer: Some("https://auth.mortrack.example".to_string()),
            leeway_secs: 0,
        });

        let token = sign(&TestClaims {
            sub: "u1".to_string(),
            role: "admin".to_string(),
            exp: future_exp(),
            name: None,
            iss: Some("https://other.example".to_string()),
        });

        assert!(verifier.verify(&token).await.is_err());

        let token = sign(&TestClaims {
            sub: "u1".to_string(),
            role: "admin".to_string(),
            exp: future_exp(),
            name: None,
            iss: Some("https://auth.mortrack.example".to_string()),
        });

        assert!(verifier.verify(&token).await.is_ok());
    }
}
