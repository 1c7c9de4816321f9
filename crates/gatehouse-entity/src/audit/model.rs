//! Audit log entry entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An immutable audit log entry recording a security-relevant action.
///
/// Entries are append-only: the core never updates or deletes them.
/// `user_id` weakly references a user and may outlive it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    /// Unique audit entry identifier.
    pub id: Uuid,
    /// The user who performed the action. `None` for system actions.
    pub user_id: Option<Uuid>,
    /// The action that was performed (e.g., `"login_failed"`,
    /// `"user_locked"`).
    pub action: String,
    /// The type of affected resource (e.g., `"user"`, `"session"`).
    pub resource: Option<String>,
    /// The affected resource id.
    pub resource_id: Option<String>,
    /// Snapshot of relevant values before the change (JSON).
    pub old_values: Option<serde_json::Value>,
    /// Snapshot of relevant values after the change (JSON).
    pub new_values: Option<serde_json::Value>,
    /// IP address of the actor.
    pub ip_address: Option<String>,
    /// User-Agent of the actor.
    pub user_agent: Option<String>,
    /// When the action occurred.
    pub created_at: DateTime<Utc>,
}

/// Filters for audit log queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditFilter {
    /// Restrict to one actor.
    pub user_id: Option<Uuid>,
    /// Restrict to one action name.
    pub action: Option<String>,
    /// Restrict to one resource type.
    pub resource: Option<String>,
}
