//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One issued refresh-token grant for one device.
///
/// Created at login, touched on every token refresh, and deactivated on
/// logout, password change, account lock, or reset completion. Refreshing
/// never extends `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the refresh token. The raw token is never
    /// stored.
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    /// Free-form device description supplied at login.
    pub device_info: Option<String>,
    /// IP address from which the session was created.
    pub ip_address: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
    /// When the session was created (login time).
    pub created_at: DateTime<Utc>,
    /// When the refresh token expires.
    pub expires_at: DateTime<Utc>,
    /// Last time the refresh token was exchanged for an access token.
    pub last_used_at: DateTime<Utc>,
    /// Whether the session can still be used.
    pub is_active: bool,
}

impl Session {
    /// Check whether the session has passed its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check whether the session can currently mint access tokens.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }
}
