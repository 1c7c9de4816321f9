//! Token creation with configurable signing and per-kind TTLs.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use gatehouse_core::config::auth::AuthConfig;
use gatehouse_core::error::AppError;
use gatehouse_core::traits::Clock;
use gatehouse_entity::user::User;

use super::claims::{Claims, TokenKind};

/// Creates signed tokens of all four kinds.
#[derive(Clone)]
pub struct TokenEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL.
    access_ttl: Duration,
    /// Refresh token TTL (before any remember-me doubling).
    refresh_ttl: Duration,
    /// Password-reset token TTL.
    reset_ttl: Duration,
    /// Email-verification token TTL.
    verification_ttl: Duration,
    /// Time source for `iat`/`exp`.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEncoder")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.access_token_ttl_minutes as i64),
            refresh_ttl: Duration::days(config.refresh_token_ttl_days as i64),
            reset_ttl: Duration::hours(config.reset_token_ttl_hours as i64),
            verification_ttl: Duration::days(config.verification_token_ttl_days as i64),
            clock,
        }
    }

    /// The access-token lifetime in seconds, reported to callers at login.
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// The refresh-token lifetime, doubled when remember-me is requested.
    pub fn refresh_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.refresh_ttl * 2
        } else {
            self.refresh_ttl
        }
    }

    /// The password-reset grant lifetime.
    pub fn reset_ttl(&self) -> Duration {
        self.reset_ttl
    }

    /// Issues an access token embedding the user's id, email, role, and the
    /// owning session id.
    pub fn issue_access(&self, user: &User, session_id: Uuid) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user.id.to_string(),
            kind: TokenKind::Access,
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
            email: Some(user.email.clone()),
            role: Some(user.role),
            session_id: Some(session_id),
            jti: None,
        };
        self.sign(&claims)
    }

    /// Issues a refresh token with a unique `jti` and the given TTL.
    pub fn issue_refresh(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user_id.to_string(),
            kind: TokenKind::Refresh,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            email: None,
            role: None,
            session_id: None,
            jti: Some(Uuid::new_v4().to_string()),
        };
        self.sign(&claims)
    }

    /// Issues a password-reset token bound to the given email address.
    pub fn issue_password_reset(&self, email: &str) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: email.to_string(),
            kind: TokenKind::PasswordReset,
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
            email: None,
            role: None,
            session_id: None,
            jti: None,
        };
        self.sign(&claims)
    }

    /// Issues an email-verification token bound to the given email address.
    pub fn issue_email_verification(&self, email: &str) -> Result<String, AppError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: email.to_string(),
            kind: TokenKind::EmailVerification,
            iat: now.timestamp(),
            exp: (now + self.verification_ttl).timestamp(),
            email: None,
            role: None,
            session_id: None,
            jti: None,
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }
}
