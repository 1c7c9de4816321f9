//! Store contracts implemented by the PostgreSQL repositories and the
//! in-memory store.
//!
//! Services depend on these traits, never on a concrete backend, so the
//! whole engine can run against fake stores in tests. Methods that must not
//! lose updates under concurrent callers (the failed-login counter) or that
//! mutate more than one table (reset consumption, locking, deactivation)
//! are single store operations: the PostgreSQL implementations use one
//! statement or one transaction, the in-memory implementation holds one
//! lock across the whole mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gatehouse_core::result::AppResult;
use gatehouse_core::types::pagination::{PageRequest, PageResponse};
use gatehouse_entity::audit::{AuditFilter, AuditLogEntry};
use gatehouse_entity::reset::PasswordResetRequest;
use gatehouse_entity::session::Session;
use gatehouse_entity::user::{LoginFailure, User, UserSearchFilter, UserStats};

/// Persistence contract for the user directory.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Insert a fully-formed user row. Fails with `Conflict` when the email
    /// is already taken.
    async fn create(&self, user: &User) -> AppResult<()>;

    /// Find a user by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Persist profile, role, and flag changes from an already-mutated
    /// entity. The password hash and the lockout counters are excluded;
    /// they have dedicated methods.
    async fn update(&self, user: &User) -> AppResult<()>;

    /// Replace the password hash and stamp `password_changed_at`, revoking
    /// every active session of the user in the same transaction.
    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Record one failed login attempt. Atomically increments the counter
    /// and, when it reaches `threshold`, marks the account locked until
    /// `lock_until`. Returns the post-increment state.
    async fn record_login_failure(
        &self,
        user_id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<LoginFailure>;

    /// Reset the failed-attempt counter to zero and clear any lock.
    async fn clear_login_failures(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Stamp a successful login.
    async fn record_login(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Permanently lock the account (`locked_until = NULL`), revoking every
    /// active session in the same transaction.
    async fn lock(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Unlock the account and reset the failed-attempt counter.
    async fn unlock(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Soft-delete the account (`is_active = false`), revoking every active
    /// session in the same transaction. The row is never removed.
    async fn deactivate(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Mark the email address verified.
    async fn mark_verified(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Filtered, sorted, paginated directory search.
    async fn search(
        &self,
        filter: &UserSearchFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>>;

    /// Aggregate directory statistics. `window_start` bounds the
    /// recent-registration and recent-login counts.
    async fn stats(&self, window_start: DateTime<Utc>) -> AppResult<UserStats>;
}

/// Persistence contract for the session registry.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Insert a fully-formed session row.
    async fn create(&self, session: &Session) -> AppResult<()>;

    /// Find a session by primary key.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>>;

    /// Find the active session holding the given refresh-token digest.
    async fn find_active_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>>;

    /// List the active sessions of a user, most recently used first.
    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>>;

    /// Update `last_used_at` after a successful token refresh.
    async fn touch(&self, session_id: Uuid, now: DateTime<Utc>) -> AppResult<()>;

    /// Deactivate one session owned by the given user. Returns `false`
    /// when no matching active session exists.
    async fn deactivate(&self, user_id: Uuid, session_id: Uuid) -> AppResult<bool>;

    /// Deactivate the session holding the given refresh-token digest, if
    /// owned by the user.
    async fn deactivate_by_token_hash(&self, user_id: Uuid, token_hash: &str) -> AppResult<bool>;

    /// Deactivate every active session of a user. Idempotent.
    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    /// Deactivate every session past its expiry. Safe to run concurrently
    /// with live traffic; filters only on `expires_at`.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Physically delete inactive sessions last used before the cutoff.
    async fn purge_inactive(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// Persistence contract for password-reset grants.
#[async_trait]
pub trait PasswordResetStore: Send + Sync + 'static {
    /// Insert a fully-formed reset request row.
    async fn create(&self, request: &PasswordResetRequest) -> AppResult<()>;

    /// Find a reset request by token digest.
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<PasswordResetRequest>>;

    /// Redeem a reset request: mark it used, replace the user's password
    /// hash, and revoke every session of the user — all in one transaction.
    /// Fails with `Conflict` when the request was already redeemed.
    async fn consume(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Delete redeemed and expired reset requests.
    async fn purge_stale(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Persistence contract for the append-only audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync + 'static {
    /// Append one immutable entry.
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()>;

    /// Filtered, paginated query, newest entries first.
    async fn search(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>>;
}
