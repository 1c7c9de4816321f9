//! Token claims structure shared by all four token kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_entity::user::Role;

/// The kind of a signed token.
///
/// The kind is embedded in the signed payload, so a token presented for the
/// wrong purpose fails verification exactly like a forgery — a
/// password-reset token can never be replayed as an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived credential presented on each request.
    Access,
    /// Longer-lived credential exchanged for new access tokens.
    Refresh,
    /// Single-purpose grant for completing a password reset.
    PasswordReset,
    /// Single-purpose grant for confirming an email address.
    EmailVerification,
}

/// Signed token payload.
///
/// The wire layout is fixed: `sub`, `type`, `iat`, `exp` on every token;
/// `email`, `role`, and `session_id` only on access tokens; `jti` only on
/// refresh tokens. Absent fields are omitted from the encoded payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a string for access and refresh tokens, the
    /// email address for reset and verification tokens.
    pub sub: String,
    /// Token kind.
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// User email (access tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// User role at issuance (access tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Owning session (access tokens only). Lets access-token claims be
    /// correlated to a session without a lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Unique token id (refresh tokens only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Parse the subject as a user id.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::invalid_token("Token subject is not a valid user id"))
    }

    /// Return the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
