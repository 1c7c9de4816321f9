//! Session lifecycle: issue, refresh, revoke, sweep.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_core::traits::Clock;
use gatehouse_core::types::RequestMeta;
use gatehouse_database::stores::{SessionStore, UserStore};
use gatehouse_entity::session::Session;
use gatehouse_entity::user::User;

use crate::token::{TokenDecoder, TokenEncoder, TokenKind, digest};

/// The token pair handed out at login.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedTokens {
    /// Short-lived access token.
    pub access_token: String,
    /// Refresh token bound to the created session.
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Creates, refreshes, revokes, and expires per-device sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    /// User lookups during refresh.
    users: Arc<dyn UserStore>,
    /// Session persistence.
    sessions: Arc<dyn SessionStore>,
    /// Token creation.
    encoder: Arc<TokenEncoder>,
    /// Token verification.
    decoder: Arc<TokenDecoder>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish()
    }
}

impl SessionRegistry {
    /// Creates a new session registry.
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        encoder: Arc<TokenEncoder>,
        decoder: Arc<TokenDecoder>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            sessions,
            encoder,
            decoder,
            clock,
        }
    }

    /// Creates a session for an authenticated user and issues its token
    /// pair.
    ///
    /// The refresh-token TTL doubles when `remember_me` is set. The access
    /// token embeds the user id, email, role, and the session id so its
    /// claims can be correlated to the session without a lookup.
    pub async fn start_session(
        &self,
        user: &User,
        remember_me: bool,
        meta: &RequestMeta,
    ) -> Result<(IssuedTokens, Session), AppError> {
        let now = self.clock.now();
        let refresh_ttl = self.encoder.refresh_ttl(remember_me);
        let refresh_token = self.encoder.issue_refresh(user.id, refresh_ttl)?;

        let session = Session {
            id: Uuid::new_v4(),
            user_id: user.id,
            refresh_token_hash: digest(&refresh_token),
            device_info: meta.device_info.clone(),
            ip_address: meta.ip_address.clone(),
            user_agent: meta.user_agent.clone(),
            created_at: now,
            expires_at: now + refresh_ttl,
            last_used_at: now,
            is_active: true,
        };
        self.sessions.create(&session).await?;

        let access_token = self.encoder.issue_access(user, session.id)?;

        info!(user_id = %user.id, session_id = %session.id, "Session created");

        Ok((
            IssuedTokens {
                access_token,
                refresh_token,
                expires_in: self.encoder.access_ttl_seconds(),
            },
            session,
        ))
    }

    /// Exchanges a refresh token for a fresh access token.
    ///
    /// Touches the session's `last_used_at` but never extends its expiry,
    /// and never rotates the refresh token: it stays valid until its own
    /// expiry or explicit revocation.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<(String, Session), AppError> {
        let claims = self
            .decoder
            .decode(refresh_token, TokenKind::Refresh)
            .map_err(|_| AppError::invalid_token("Invalid or expired refresh token"))?;

        let now = self.clock.now();
        let session = self
            .sessions
            .find_active_by_token_hash(&digest(refresh_token))
            .await?
            .filter(|s| s.is_usable(now))
            .ok_or_else(|| AppError::not_found("Session not found"))?;

        let user = self
            .users
            .find_by_id(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        if !user.is_active {
            return Err(AppError::account_inactive());
        }

        self.sessions.touch(session.id, now).await?;

        let access_token = self.encoder.issue_access(&user, session.id)?;

        info!(user_id = %user.id, session_id = %session.id, "Access token refreshed");

        Ok((access_token, session))
    }

    /// Deactivates one session owned by the user.
    pub async fn revoke(&self, user_id: Uuid, session_id: Uuid) -> Result<(), AppError> {
        let revoked = self.sessions.deactivate(user_id, session_id).await?;
        if !revoked {
            return Err(AppError::not_found(format!(
                "Active session {session_id} not found"
            )));
        }
        info!(user_id = %user_id, session_id = %session_id, "Session revoked");
        Ok(())
    }

    /// Deactivates the session bound to the presented refresh token, if it
    /// belongs to the user. Returns whether a session was revoked.
    pub async fn revoke_by_token(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<bool, AppError> {
        self.sessions
            .deactivate_by_token_hash(user_id, &digest(refresh_token))
            .await
    }

    /// Deactivates every session of the user. Idempotent: revoking an
    /// already-empty set is a no-op.
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.sessions.deactivate_all_for_user(user_id).await?;
        if revoked > 0 {
            info!(user_id = %user_id, revoked, "All sessions revoked");
        }
        Ok(revoked)
    }

    /// Lists the user's active sessions, most recently used first.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<Session>, AppError> {
        self.sessions.find_active_by_user(user_id).await
    }

    /// Deactivates every session past its expiry. Runs from the periodic
    /// maintenance schedule, never inline per-request, and is safe to run
    /// concurrently with live traffic.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        self.sessions.deactivate_expired(self.clock.now()).await
    }
}
