// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed, time-bounded identity tokens (HS256 JWT).
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use notes_common::UserId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TokenSettings;
use crate::error::AppError;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id, as a decimal string
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: UserId, email: &str, issued_at: i64, ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl),
        }
    }

    /// The subject parsed back into a user id
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

/// Mints and checks identity tokens
pub trait TokenIssuer: Send + Sync {
    /// Sign a token for `user_id` valid for the configured lifetime
    fn issue(&self, user_id: UserId, email: &str) -> Result<String, AppError>;

    /// Check signature and expiry, returning the claims
    fn verify(&self, token: &str) -> Result<Claims, AppError>;
}

/// HMAC-SHA256 JWT issuer
pub struct JwtIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_settings(settings: &TokenSettings) -> Self {
        Self::new(settings.secret.as_bytes(), settings.ttl())
    }

    /// Sign a token as if it had been issued at `issued_at` (unix seconds)
    pub fn issue_at(&self, user_id: UserId, email: &str, issued_at: i64) -> Result<String, AppError> {
        let claims = Claims::new(user_id, email, issued_at, self.ttl);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, user_id: UserId, email: &str) -> Result<String, AppError> {
        self.issue_at(user_id, email, now_secs())
    }

    fn verify(&self, token: &str) -> Result<Claims, AppError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "Token expired",
                    ErrorKind::InvalidSignature => "Invalid token signature",
                    _ => "Invalid token",
                };
                debug!(error = %e, "token rejected");
                AppError::Unauthorized(reason.to_string())
            })
    }
}
