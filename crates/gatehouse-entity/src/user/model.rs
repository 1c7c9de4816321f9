//! User entity model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

/// A registered user.
///
/// Users are never hard-deleted: deletion is modeled as `is_active = false`
/// plus session revocation, so sessions and audit entries can keep
/// referencing the id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address (unique, stored lowercase).
    pub email: String,
    /// Argon2id password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Assigned role.
    pub role: Role,
    /// Whether the account may be used at all.
    pub is_active: bool,
    /// Whether the email address has been verified.
    pub is_verified: bool,
    /// Whether the account is locked. This flag is the authoritative lock
    /// discriminator; `locked_until` is only meaningful while it is set.
    pub is_locked: bool,
    /// Consecutive failed login attempts since the last success or unlock.
    pub failed_login_attempts: i32,
    /// End of a temporary lock. `None` while `is_locked` means the lock is
    /// permanent (admin-imposed).
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login time.
    pub last_login_at: Option<DateTime<Utc>>,
    /// When the password was last changed.
    pub password_changed_at: DateTime<Utc>,
    /// When the email address was verified.
    pub email_verified_at: Option<DateTime<Utc>>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The user's full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Outcome of recording one failed login attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoginFailure {
    /// The counter value after the increment.
    pub attempts: i32,
    /// Whether this failure left the account locked.
    pub locked: bool,
}

/// Sortable columns for directory searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    /// Sort by email address.
    Email,
    /// Sort by given name.
    FirstName,
    /// Sort by family name.
    LastName,
    /// Sort by role.
    Role,
    /// Sort by last login time.
    LastLogin,
    /// Sort by creation time.
    CreatedAt,
}

/// Filters for directory searches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserSearchFilter {
    /// Case-insensitive term matched against email and names.
    pub term: Option<String>,
    /// Restrict to one role.
    pub role: Option<Role>,
    /// Restrict by active flag.
    pub is_active: Option<bool>,
    /// Restrict by verified flag.
    pub is_verified: Option<bool>,
    /// Restrict by locked flag.
    pub is_locked: Option<bool>,
    /// Sort column. Defaults to creation time.
    pub sort_by: Option<UserSortField>,
    /// Sort direction.
    pub sort_desc: bool,
}

/// Aggregate directory statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    /// Total registered users.
    pub total_users: u64,
    /// Users with `is_active` set.
    pub active_users: u64,
    /// Users with `is_verified` set.
    pub verified_users: u64,
    /// Users with `is_locked` set.
    pub locked_users: u64,
    /// User counts per role.
    pub users_by_role: HashMap<Role, u64>,
    /// Users created within the stats window.
    pub recent_registrations: u64,
    /// Users who logged in within the stats window.
    pub recent_logins: u64,
}
