//! Password-reset request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One outstanding password-reset grant.
///
/// At most one valid consumption is permitted: the first successful
/// redemption marks the request used and revokes every session of the
/// owning user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordResetRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// The user this reset belongs to.
    pub user_id: Uuid,
    /// SHA-256 hex digest of the reset token. The raw token is never stored.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// Whether the request has been redeemed.
    pub is_used: bool,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// When the request expires.
    pub expires_at: DateTime<Utc>,
    /// When the request was redeemed.
    pub used_at: Option<DateTime<Utc>>,
    /// IP address of the requester.
    pub ip_address: Option<String>,
    /// User-Agent of the requester.
    pub user_agent: Option<String>,
}

impl PasswordResetRequest {
    /// Check whether the request can still be redeemed.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && now < self.expires_at
    }
}
