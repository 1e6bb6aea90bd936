//! Stateless JWT minting and verification.
//!
//! Three token kinds share one signing secret: short-lived access tokens,
//! long-lived refresh tokens, and single-purpose password reset tokens.
//! A token minted for one purpose never verifies as another.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Covers expiry, bad signature, malformed input and kind mismatch.
    /// Callers get one error so responses cannot leak why a token failed.
    #[error("Invalid or expired token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
    Reset,
}

impl TokenKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Reset => "reset",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    kind: String,
    iat: i64,
    exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_expiry_minutes: i64,
    refresh_expiry_days: i64,
    reset_expiry_minutes: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(
        secret: &str,
        access_expiry_minutes: i64,
        refresh_expiry_days: i64,
        reset_expiry_minutes: i64,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_expiry_minutes,
            refresh_expiry_days,
            reset_expiry_minutes,
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_expire_minutes,
            config.refresh_token_expire_days,
            config.reset_token_expire_minutes,
        )
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.access_expiry_minutes),
            TokenKind::Refresh => Duration::days(self.refresh_expiry_days),
            TokenKind::Reset => Duration::minutes(self.reset_expiry_minutes),
        }
    }

    pub fn mint(&self, user_id: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            kind: kind.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime(kind)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return the subject user id.
    /// The token must carry the expected kind.
    pub fn verify(&self, token: &str, expected_kind: TokenKind) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.kind != expected_kind.as_str() {
            return Err(TokenError::Invalid);
        }

        Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 30, 7, 60)
    }

    #[test]
    fn access_token_round_trip() {
        let svc = service();
        let user_id = Uuid::new_v4();

        let token = svc.mint(user_id, TokenKind::Access).unwrap();
        let subject = svc.verify(&token, TokenKind::Access).unwrap();

        assert_eq!(subject, user_id);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let svc = service();
        let token = svc.mint(Uuid::new_v4(), TokenKind::Refresh).unwrap();

        assert!(matches!(
            svc.verify(&token, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn reset_token_rejected_as_refresh() {
        let svc = service();
        let token = svc.mint(Uuid::new_v4(), TokenKind::Reset).unwrap();

        assert!(matches!(
            svc.verify(&token, TokenKind::Refresh),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let svc = TokenService::new("test-secret", -5, 7, 60);
        let token = svc.mint(Uuid::new_v4(), TokenKind::Access).unwrap();

        assert!(matches!(
            svc.verify(&token, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = service().mint(Uuid::new_v4(), TokenKind::Access).unwrap();
        let other = TokenService::new("different-secret", 30, 7, 60);

        assert!(matches!(
            other.verify(&token, TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn garbage_rejected() {
        assert!(matches!(
            service().verify("not-a-token", TokenKind::Access),
            Err(TokenError::Invalid)
        ));
    }
}
