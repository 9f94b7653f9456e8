//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Authentication configuration (HS256 JWT verification)
///
/// The relay and the REST middleware verify the same bearer token, so a
/// single shared secret covers both surfaces.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify HS256-signed tokens
    pub jwt_secret: String,

    /// Expected `iss` claim; skipped when unset
    pub issuer: Option<String>,

    /// Allowed clock skew for `exp` validation, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ValidationError::EmptyJwtSecret);
        }
        Ok(())
    }
}

fn default_leeway() -> u64 {
    30
}
