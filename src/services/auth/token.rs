use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::services::auth::principal::Role;

/// Claims carried inside a session token.
///
/// Wire field names are fixed (`userId`, `username`, `role`, `iat`, `exp`);
/// clients replay the token opaquely and never build one themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub username: String,
    pub role: Role,
    /// epoch seconds
    pub iat: i64,
    /// epoch seconds
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Malformed structure or bad signature. Collapsed into one variant so the
    /// request boundary cannot leak which check failed.
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
}

/// HS512 session-token issuer/verifier.
///
/// Stateless; a single instance is shared across all requests. Signature
/// verification (`parse`) and expiry (`verify`/`validate`) are split so that
/// an expired-but-authentic token can still be decoded for diagnostics.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    parse_validation: Validation,
    lifetime_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenService")
            .field("lifetime_seconds", &self.lifetime_seconds)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &str, expiration_millis: i64) -> Self {
        let mut parse_validation = Validation::new(Algorithm::HS512);
        // expiry is checked separately in `verify`; `parse` is signature/structure only
        parse_validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            parse_validation,
            lifetime_seconds: expiration_millis / 1000,
        }
    }

    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime_seconds
    }

    /// Issue a token for an authenticated subject, with `iat = now` and
    /// `exp = now + configured lifetime`.
    pub fn issue(&self, user_id: i64, username: &str, role: Role) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        self.sign(&Claims {
            user_id,
            username: username.to_string(),
            role,
            iat: now,
            exp: now + self.lifetime_seconds,
        })
    }

    /// Sign caller-supplied claims as-is (the validity window is not touched).
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS512), claims, &self.encoding_key).map_err(
            |e| {
                error!(error = %e, "failed to sign session token");
                TokenError::Invalid(e)
            },
        )
    }

    /// Decode and verify the signature. Expiry is NOT checked here.
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.parse_validation)?;
        Ok(data.claims)
    }

    /// `parse` + expiry check.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.parse(token)?;
        if claims.exp < Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// The safe boolean gate used for request filtering. Collapses every
    /// failure mode (malformed, bad signature, expired) into `false`.
    pub fn validate(&self, token: &str) -> bool {
        self.verify(token).is_ok()
    }

    pub fn user_id_of(&self, token: &str) -> Result<i64, TokenError> {
        Ok(self.parse(token)?.user_id)
    }

    pub fn username_of(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.parse(token)?.username)
    }

    pub fn role_of(&self, token: &str) -> Result<Role, TokenError> {
        Ok(self.parse(token)?.role)
    }

    pub fn expires_at(&self, token: &str) -> Result<DateTime<Utc>, TokenError> {
        let claims = self.parse(token)?;
        DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Expired)
    }
}
