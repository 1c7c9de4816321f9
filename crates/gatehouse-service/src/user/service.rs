//! User self-service operations — profile viewing, profile updates,
//! password changes, and device management.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use gatehouse_auth::password::{PasswordHasher, PasswordPolicy};
use gatehouse_auth::session::SessionRegistry;
use gatehouse_core::error::{AppError, ErrorKind};
use gatehouse_core::traits::Clock;
use gatehouse_database::stores::UserStore;
use gatehouse_entity::session::Session;
use gatehouse_entity::user::User;

use crate::audit::AuditService;
use crate::context::RequestContext;

/// Data for updating a user's own profile.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UpdateProfileRequest {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
    /// New avatar URL.
    pub avatar_url: Option<String>,
}

/// Handles user self-service operations.
#[derive(Clone)]
pub struct UserService {
    /// User directory.
    users: Arc<dyn UserStore>,
    /// Session registry for device management.
    registry: Arc<SessionRegistry>,
    /// Password hashing.
    hasher: Arc<PasswordHasher>,
    /// Password strength policy.
    password_policy: PasswordPolicy,
    /// Audit trail.
    audit: Arc<AuditService>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish()
    }
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        registry: Arc<SessionRegistry>,
        hasher: Arc<PasswordHasher>,
        password_policy: PasswordPolicy,
        audit: Arc<AuditService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            registry,
            hasher,
            password_policy,
            audit,
            clock,
        }
    }

    /// Gets the current user's full profile.
    pub async fn get_profile(&self, ctx: &RequestContext) -> Result<User, AppError> {
        self.users
            .find_by_id(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Updates the current user's profile fields.
    pub async fn update_profile(
        &self,
        ctx: &RequestContext,
        req: UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let mut user = self.get_profile(ctx).await?;

        let old_values = json!({
            "first_name": user.first_name,
            "last_name": user.last_name,
            "avatar_url": user.avatar_url,
        });

        if let Some(first_name) = req.first_name {
            if first_name.trim().is_empty() {
                return Err(AppError::validation("First name cannot be empty"));
            }
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            if last_name.trim().is_empty() {
                return Err(AppError::validation("Last name cannot be empty"));
            }
            user.last_name = last_name;
        }
        if let Some(avatar_url) = req.avatar_url {
            user.avatar_url = Some(avatar_url);
        }

        user.updated_at = self.clock.now();
        self.users.update(&user).await?;

        let new_values = json!({
            "first_name": user.first_name,
            "last_name": user.last_name,
            "avatar_url": user.avatar_url,
        });

        self.audit
            .record(
                Some(ctx.user_id),
                "profile_updated",
                Some("user"),
                Some(user.id.to_string()),
                Some(old_values),
                Some(new_values),
                &ctx.meta,
            )
            .await?;

        info!(user_id = %ctx.user_id, "Profile updated");

        Ok(user)
    }

    /// Changes the current user's password.
    ///
    /// Verifies the current password, enforces the strength policy, and
    /// revokes every session of the user in the same store transaction as
    /// the hash update.
    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self.get_profile(ctx).await?;

        if !self.hasher.verify(current_password, &user.password_hash)? {
            return Err(AppError::new(
                ErrorKind::InvalidCredentials,
                "Current password is incorrect",
            ));
        }

        self.password_policy
            .require_different(current_password, new_password)?;
        self.password_policy.require(new_password)?;

        let new_hash = self.hasher.hash(new_password)?;
        self.users
            .update_password(ctx.user_id, &new_hash, self.clock.now())
            .await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "password_changed",
                Some("user"),
                Some(user.id.to_string()),
                None,
                None,
                &ctx.meta,
            )
            .await?;

        info!(user_id = %ctx.user_id, "Password changed");

        Ok(())
    }

    /// Lists the current user's active sessions, most recently used first.
    pub async fn list_sessions(&self, ctx: &RequestContext) -> Result<Vec<Session>, AppError> {
        self.registry.list_sessions(ctx.user_id).await
    }

    /// Revokes one of the current user's sessions.
    pub async fn revoke_session(
        &self,
        ctx: &RequestContext,
        session_id: Uuid,
    ) -> Result<(), AppError> {
        self.registry.revoke(ctx.user_id, session_id).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "session_revoked",
                Some("session"),
                Some(session_id.to_string()),
                None,
                None,
                &ctx.meta,
            )
            .await
    }
}
