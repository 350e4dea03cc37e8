/// Capability tokens issued at login
///
/// HS256 over a shared secret. Claims carry the username and an expiry;
/// the middleware trusts nothing else.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;
const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub username: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    /// Keys for `secret`. A lifetime chrono cannot represent falls back to
    /// 24 hours.
    pub fn from_secret(secret: &str, ttl_hours: i64) -> Self {
        let ttl = Duration::try_hours(ttl_hours).unwrap_or_else(|| {
            tracing::warn!(ttl_hours, "Token lifetime out of range; using default");
            Duration::hours(DEFAULT_TTL_HOURS)
        });

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Sign a token for `username` valid for the configured lifetime.
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("Token expiry overflows".into()))?;
        let claims = Claims {
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Check signature and expiry, returning the claims.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {e}")))?;

        if data.claims.username.is_empty() {
            return Err(AppError::Unauthorized("Invalid token: empty username".into()));
        }

        Ok(data.claims)
    }
}
