//! In-memory store using a Tokio mutex for single-node deployments and
//! deterministic tests.
//!
//! One mutex guards all tables, so the multi-table operations
//! (`consume`, `lock`, `deactivate`, `update_password`) are atomic under
//! the same lock that single-table operations take.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_core::result::AppResult;
use gatehouse_core::types::pagination::{PageRequest, PageResponse};
use gatehouse_entity::audit::{AuditFilter, AuditLogEntry};
use gatehouse_entity::reset::PasswordResetRequest;
use gatehouse_entity::session::Session;
use gatehouse_entity::user::{LoginFailure, User, UserSearchFilter, UserSortField, UserStats};

use crate::stores::{AuditStore, PasswordResetStore, SessionStore, UserStore};

/// Internal table state for the memory store.
#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    resets: HashMap<Uuid, PasswordResetRequest>,
    audit: Vec<AuditLogEntry>,
}

/// In-memory implementation of all four store traits.
///
/// Suitable for single-node deployments without PostgreSQL, and the fake
/// store the flow tests run against.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Create an empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let email = user.email.to_lowercase();
        if state.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(AppError::conflict("A user with this email already exists"));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let state = self.state.lock().await;
        let email = email.to_lowercase();
        Ok(state
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let existing = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user.id)))?;
        existing.email = user.email.clone();
        existing.first_name = user.first_name.clone();
        existing.last_name = user.last_name.clone();
        existing.avatar_url = user.avatar_url.clone();
        existing.role = user.role;
        existing.is_active = user.is_active;
        existing.is_verified = user.is_verified;
        existing.email_verified_at = user.email_verified_at;
        existing.updated_at = user.updated_at;
        Ok(())
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.password_hash = password_hash.to_string();
        user.password_changed_at = now;
        user.updated_at = now;
        deactivate_sessions(&mut state, user_id);
        Ok(())
    }

    async fn record_login_failure(
        &self,
        user_id: Uuid,
        threshold: i32,
        lock_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<LoginFailure> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.failed_login_attempts += 1;
        let locked = user.failed_login_attempts >= threshold;
        if locked {
            user.is_locked = true;
            user.locked_until = Some(lock_until);
        }
        user.updated_at = now;
        Ok(LoginFailure {
            attempts: user.failed_login_attempts,
            locked,
        })
    }

    async fn clear_login_failures(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.failed_login_attempts = 0;
            user.is_locked = false;
            user.locked_until = None;
            user.updated_at = now;
        }
        Ok(())
    }

    async fn record_login(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.get_mut(&user_id) {
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn lock(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.is_locked = true;
        user.locked_until = None;
        user.updated_at = now;
        deactivate_sessions(&mut state, user_id);
        Ok(())
    }

    async fn unlock(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.is_locked = false;
        user.locked_until = None;
        user.failed_login_attempts = 0;
        user.updated_at = now;
        Ok(())
    }

    async fn deactivate(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.is_active = false;
        user.updated_at = now;
        deactivate_sessions(&mut state, user_id);
        Ok(())
    }

    async fn mark_verified(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.is_verified = true;
        user.email_verified_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn search(
        &self,
        filter: &UserSearchFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<User>> {
        let state = self.state.lock().await;
        let term = filter.term.as_ref().map(|t| t.to_lowercase());

        let mut matches: Vec<User> = state
            .users
            .values()
            .filter(|u| {
                if let Some(ref term) = term {
                    let full_name = format!("{} {}", u.first_name, u.last_name).to_lowercase();
                    if !u.email.to_lowercase().contains(term)
                        && !u.first_name.to_lowercase().contains(term)
                        && !u.last_name.to_lowercase().contains(term)
                        && !full_name.contains(term)
                    {
                        return false;
                    }
                }
                filter.role.is_none_or(|r| u.role == r)
                    && filter.is_active.is_none_or(|a| u.is_active == a)
                    && filter.is_verified.is_none_or(|v| u.is_verified == v)
                    && filter.is_locked.is_none_or(|l| u.is_locked == l)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match filter.sort_by.unwrap_or(UserSortField::CreatedAt) {
                UserSortField::Email => a.email.cmp(&b.email),
                UserSortField::FirstName => a.first_name.cmp(&b.first_name),
                UserSortField::LastName => a.last_name.cmp(&b.last_name),
                UserSortField::Role => a.role.as_str().cmp(b.role.as_str()),
                UserSortField::LastLogin => a.last_login_at.cmp(&b.last_login_at),
                UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            };
            if filter.sort_desc {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let total = matches.len() as u64;
        let items: Vec<User> = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }

    async fn stats(&self, window_start: DateTime<Utc>) -> AppResult<UserStats> {
        let state = self.state.lock().await;
        let users: Vec<&User> = state.users.values().collect();

        let mut users_by_role = HashMap::new();
        for user in &users {
            *users_by_role.entry(user.role).or_insert(0u64) += 1;
        }

        Ok(UserStats {
            total_users: users.len() as u64,
            active_users: users.iter().filter(|u| u.is_active).count() as u64,
            verified_users: users.iter().filter(|u| u.is_verified).count() as u64,
            locked_users: users.iter().filter(|u| u.is_locked).count() as u64,
            users_by_role,
            recent_registrations: users.iter().filter(|u| u.created_at >= window_start).count()
                as u64,
            recent_logins: users
                .iter()
                .filter(|u| u.last_login_at.is_some_and(|t| t >= window_start))
                .count() as u64,
        })
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: &Session) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(&id).cloned())
    }

    async fn find_active_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .find(|s| s.is_active && s.refresh_token_hash == token_hash)
            .cloned())
    }

    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Vec<Session>> {
        let state = self.state.lock().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.is_active && s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
        Ok(sessions)
    }

    async fn touch(&self, session_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.get_mut(&session_id) {
            session.last_used_at = now;
        }
        Ok(())
    }

    async fn deactivate(&self, user_id: Uuid, session_id: Uuid) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(&session_id) {
            Some(session) if session.user_id == user_id && session.is_active => {
                session.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn deactivate_by_token_hash(&self, user_id: Uuid, token_hash: &str) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        for session in state.sessions.values_mut() {
            if session.is_active
                && session.user_id == user_id
                && session.refresh_token_hash == token_hash
            {
                session.is_active = false;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        Ok(deactivate_sessions(&mut state, user_id))
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let mut count = 0;
        for session in state.sessions.values_mut() {
            if session.is_active && session.expires_at < now {
                session.is_active = false;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn purge_inactive(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let initial = state.sessions.len();
        state
            .sessions
            .retain(|_, s| s.is_active || s.last_used_at >= before);
        Ok((initial - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl PasswordResetStore for MemoryStore {
    async fn create(&self, request: &PasswordResetRequest) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.resets.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> AppResult<Option<PasswordResetRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .resets
            .values()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn consume(
        &self,
        request_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;

        let request = state
            .resets
            .get_mut(&request_id)
            .ok_or_else(|| AppError::not_found("Password reset request not found"))?;
        if request.is_used {
            return Err(AppError::conflict("Password reset request already used"));
        }
        request.is_used = true;
        request.used_at = Some(now);

        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        user.password_hash = password_hash.to_string();
        user.password_changed_at = now;
        user.updated_at = now;

        deactivate_sessions(&mut state, user_id);
        Ok(())
    }

    async fn purge_stale(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        let initial = state.resets.len();
        state.resets.retain(|_, r| !r.is_used && r.expires_at >= now);
        Ok((initial - state.resets.len()) as u64)
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, entry: &AuditLogEntry) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.audit.push(entry.clone());
        Ok(())
    }

    async fn search(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AuditLogEntry>> {
        let state = self.state.lock().await;
        let mut matches: Vec<AuditLogEntry> = state
            .audit
            .iter()
            .filter(|e| {
                filter.user_id.is_none_or(|id| e.user_id == Some(id))
                    && filter.action.as_ref().is_none_or(|a| &e.action == a)
                    && filter
                        .resource
                        .as_ref()
                        .is_none_or(|r| e.resource.as_ref() == Some(r))
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len() as u64;
        let items: Vec<AuditLogEntry> = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PageResponse::new(items, page.page, page.page_size, total))
    }
}

/// Deactivate every active session of a user. Returns the number revoked.
fn deactivate_sessions(state: &mut State, user_id: Uuid) -> u64 {
    let mut count = 0;
    for session in state.sessions.values_mut() {
        if session.is_active && session.user_id == user_id {
            session.is_active = false;
            count += 1;
        }
    }
    count
}
