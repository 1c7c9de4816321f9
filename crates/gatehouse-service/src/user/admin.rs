//! Directory management — creation, updates, role assignment, locking,
//! and deactivation, all gated by the authorization engine and audited.

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::ValidateEmail;

use gatehouse_auth::authz::{AccessControl, Permission};
use gatehouse_auth::password::{PasswordHasher, PasswordPolicy};
use gatehouse_core::error::AppError;
use gatehouse_core::traits::Clock;
use gatehouse_core::types::pagination::{PageRequest, PageResponse};
use gatehouse_database::stores::UserStore;
use gatehouse_entity::user::{Role, User, UserSearchFilter, UserStats};

use crate::audit::AuditService;
use crate::context::RequestContext;

/// Window used for the recent-activity counts in directory statistics.
const STATS_WINDOW_DAYS: i64 = 30;

/// Request to create a new user.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateUserRequest {
    /// Email address (unique).
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Role assignment.
    pub role: Role,
}

/// Request to update a user's directory record.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AdminUpdateUserRequest {
    /// New given name.
    pub first_name: Option<String>,
    /// New family name.
    pub last_name: Option<String>,
}

/// Handles administrative directory operations.
#[derive(Clone)]
pub struct AdminUserService {
    /// User directory.
    users: Arc<dyn UserStore>,
    /// Password hashing.
    hasher: Arc<PasswordHasher>,
    /// Password strength policy.
    password_policy: PasswordPolicy,
    /// Access checks.
    access: AccessControl,
    /// Audit trail.
    audit: Arc<AuditService>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AdminUserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUserService").finish()
    }
}

impl AdminUserService {
    /// Creates a new admin user service.
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<PasswordHasher>,
        password_policy: PasswordPolicy,
        audit: Arc<AuditService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            hasher,
            password_policy,
            access: AccessControl::new(),
            audit,
            clock,
        }
    }

    /// Creates a new user with the requested role.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        req: CreateUserRequest,
    ) -> Result<User, AppError> {
        let required = if req.role.is_admin() {
            Permission::ManageAdmins
        } else {
            Permission::ManageUsers
        };
        self.access.require_permission(ctx.role, required)?;
        self.access.require_assign_role(ctx.role, req.role)?;

        if !req.email.validate_email() {
            return Err(AppError::validation("Invalid email format"));
        }
        let email = req.email.to_lowercase();

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("A user with this email already exists"));
        }

        self.password_policy.require(&req.password)?;
        let password_hash = self.hasher.hash(&req.password)?;

        let now = self.clock.now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            avatar_url: None,
            role: req.role,
            is_active: true,
            is_verified: false,
            is_locked: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            password_changed_at: now,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "user_created",
                Some("user"),
                Some(user.id.to_string()),
                None,
                Some(json!({
                    "email": user.email,
                    "first_name": user.first_name,
                    "last_name": user.last_name,
                    "role": user.role,
                })),
                &ctx.meta,
            )
            .await?;

        info!(
            actor_id = %ctx.user_id,
            new_user_id = %user.id,
            role = %user.role,
            "User created"
        );

        Ok(user)
    }

    /// Gets a user's directory record.
    pub async fn get_user(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.access.require_view(ctx.role, ctx.user_id, &user)?;

        Ok(user)
    }

    /// Searches the directory with filters and pagination.
    ///
    /// Admin tiers only see plain users; the role filter is forced for
    /// them. Superadmins see everyone.
    pub async fn search_users(
        &self,
        ctx: &RequestContext,
        mut filter: UserSearchFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<User>, AppError> {
        self.access
            .require_permission(ctx.role, Permission::ManageUsers)?;

        if !ctx.role.is_superadmin() {
            filter.role = Some(Role::User);
        }

        self.users.search(&filter, page).await
    }

    /// Returns aggregate directory statistics.
    pub async fn stats(&self, ctx: &RequestContext) -> Result<UserStats, AppError> {
        self.access
            .require_permission(ctx.role, Permission::ViewAnalytics)?;

        let window_start = self.clock.now() - Duration::days(STATS_WINDOW_DAYS);
        self.users.stats(window_start).await
    }

    /// Updates a user's directory record.
    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        req: AdminUpdateUserRequest,
    ) -> Result<User, AppError> {
        let mut user = self.fetch_managed(ctx, user_id).await?;

        let old_values = json!({
            "first_name": user.first_name,
            "last_name": user.last_name,
        });

        if let Some(first_name) = req.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            user.last_name = last_name;
        }
        user.updated_at = self.clock.now();

        self.users.update(&user).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "user_updated",
                Some("user"),
                Some(user_id.to_string()),
                Some(old_values),
                Some(json!({
                    "first_name": user.first_name,
                    "last_name": user.last_name,
                })),
                &ctx.meta,
            )
            .await?;

        Ok(user)
    }

    /// Assigns a new role to a user.
    pub async fn assign_role(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        new_role: Role,
    ) -> Result<User, AppError> {
        if user_id == ctx.user_id {
            return Err(AppError::permission_denied("Cannot change your own role"));
        }

        let mut user = self.fetch_managed(ctx, user_id).await?;
        self.access.require_assign_role(ctx.role, new_role)?;

        let old_role = user.role;
        user.role = new_role;
        user.updated_at = self.clock.now();
        self.users.update(&user).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "role_assigned",
                Some("user"),
                Some(user_id.to_string()),
                Some(json!({ "role": old_role })),
                Some(json!({ "role": new_role })),
                &ctx.meta,
            )
            .await?;

        info!(
            actor_id = %ctx.user_id,
            target_id = %user_id,
            old_role = %old_role,
            new_role = %new_role,
            "Role assigned"
        );

        Ok(user)
    }

    /// Permanently locks a user's account and revokes their sessions.
    /// The lock holds until an explicit unlock.
    pub async fn lock_user(&self, ctx: &RequestContext, user_id: Uuid) -> Result<(), AppError> {
        if user_id == ctx.user_id {
            return Err(AppError::permission_denied("Cannot lock your own account"));
        }

        let user = self.fetch_managed(ctx, user_id).await?;
        self.users.lock(user_id, self.clock.now()).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "user_locked",
                Some("user"),
                Some(user_id.to_string()),
                Some(json!({ "is_locked": user.is_locked })),
                Some(json!({ "is_locked": true })),
                &ctx.meta,
            )
            .await?;

        info!(actor_id = %ctx.user_id, target_id = %user_id, "User locked");

        Ok(())
    }

    /// Unlocks a user's account and resets the failed-attempt counter.
    pub async fn unlock_user(&self, ctx: &RequestContext, user_id: Uuid) -> Result<(), AppError> {
        let user = self.fetch_managed(ctx, user_id).await?;
        self.users.unlock(user_id, self.clock.now()).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "user_unlocked",
                Some("user"),
                Some(user_id.to_string()),
                Some(json!({ "is_locked": user.is_locked })),
                Some(json!({ "is_locked": false })),
                &ctx.meta,
            )
            .await?;

        info!(actor_id = %ctx.user_id, target_id = %user_id, "User unlocked");

        Ok(())
    }

    /// Deactivates a user's account and revokes their sessions. The row is
    /// kept so sessions and audit entries can keep referencing the id.
    pub async fn deactivate_user(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if user_id == ctx.user_id {
            return Err(AppError::permission_denied(
                "Cannot deactivate your own account",
            ));
        }

        self.fetch_managed(ctx, user_id).await?;
        self.users.deactivate(user_id, self.clock.now()).await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "user_deleted",
                Some("user"),
                Some(user_id.to_string()),
                Some(json!({ "is_active": true })),
                Some(json!({ "is_active": false })),
                &ctx.meta,
            )
            .await?;

        info!(actor_id = %ctx.user_id, target_id = %user_id, "User deactivated");

        Ok(())
    }

    /// Sets a new password for a user, revoking their sessions.
    pub async fn reset_password(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        self.fetch_managed(ctx, user_id).await?;

        self.password_policy.require(new_password)?;
        let password_hash = self.hasher.hash(new_password)?;
        self.users
            .update_password(user_id, &password_hash, self.clock.now())
            .await?;

        self.audit
            .record(
                Some(ctx.user_id),
                "password_reset_by_admin",
                Some("user"),
                Some(user_id.to_string()),
                None,
                None,
                &ctx.meta,
            )
            .await?;

        info!(actor_id = %ctx.user_id, target_id = %user_id, "Password reset by admin");

        Ok(())
    }

    /// Loads a user and requires management rights over them.
    async fn fetch_managed(&self, ctx: &RequestContext, user_id: Uuid) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.access.require_manage(ctx.role, ctx.user_id, &user)?;

        Ok(user)
    }
}
