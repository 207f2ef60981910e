//! Bearer token authentication.
//!
//! Every write needs an acting user id. Callers present an HS256 JWT whose
//! `sub` claim is the numeric user id; the [`Identity`] extractor verifies
//! it and hands the id to the handler.

mod extractor;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::error::{AppError, AppResult};

pub use extractor::{AuthError, Identity};

/// Claims carried by identity tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Acting user id
    pub sub: String,
    pub role: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Verifies (and, for tooling, issues) identity tokens.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: SecretString,
    issuer: Option<String>,
}

impl TokenVerifier {
    pub fn new(settings: &AuthSettings) -> Self {
        Self {
            secret: settings.jwt_secret.clone(),
            issuer: settings.issuer.clone(),
        }
    }

    /// Check signature, expiry and (when configured) issuer, returning the acting identity.
    pub fn verify(&self, token: &str) -> Result<Identity, String> {
        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_aud = false;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<Claims>(token, &key, &validation)
            .map_err(|e| format!("Invalid token: {}", e))?;

        let user_id = data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| "Token subject is not a user id".to_string())?;

        Ok(Identity {
            user_id,
            role: data.claims.role,
        })
    }

    /// Sign a token for `user_id` valid for `ttl_secs`.
    pub fn issue(&self, user_id: i32, role: &str, ttl_secs: u64) -> AppResult<String> {
        let exp = Utc::now() + chrono::Duration::seconds(ttl_secs as i64);
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            exp: exp.timestamp() as usize,
            iss: self.issuer.clone(),
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::default(), &claims, &key)
            .map_err(|e| AppError::InvalidInput(format!("Failed to create token: {}", e)))
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .finish()
    }
}
