//! Authorization checks: permission lookups and cross-role management
//! rules.
//!
//! All checks are pure functions of role and ownership — no hidden state.
//! The management matrix: a superadmin manages everyone except *other*
//! superadmins (themself included), an admin tier manages only plain users,
//! a plain user manages only themself. Admin tiers are siblings; none
//! manages another.

use uuid::Uuid;

use gatehouse_core::error::AppError;
use gatehouse_entity::user::{Role, User};

use super::policies::{Permission, permissions_for};

/// Role-based access checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControl;

impl AccessControl {
    /// Creates the access control checker.
    pub fn new() -> Self {
        Self
    }

    /// Whether the role holds the given permission.
    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        permissions_for(role).contains(&permission)
    }

    /// Whether the actor may manage (edit, lock, deactivate) the target.
    pub fn can_manage(&self, actor_role: Role, actor_id: Uuid, target: &User) -> bool {
        match actor_role {
            Role::Superadmin => !target.role.is_superadmin() || target.id == actor_id,
            Role::Admin1 | Role::Admin2 | Role::Admin3 => target.role == Role::User,
            Role::User => target.id == actor_id,
        }
    }

    /// Whether the actor may view the target's record.
    pub fn can_view(&self, actor_role: Role, actor_id: Uuid, target: &User) -> bool {
        match actor_role {
            Role::Superadmin => true,
            Role::Admin1 | Role::Admin2 | Role::Admin3 => {
                target.role == Role::User || target.id == actor_id
            }
            Role::User => target.id == actor_id,
        }
    }

    /// Whether the actor may assign the given role to an account.
    ///
    /// Any admin-tier or superadmin role may only be assigned by a
    /// superadmin; the plain-user role requires at least an admin tier.
    pub fn can_assign_role(&self, actor_role: Role, target_role: Role) -> bool {
        match target_role {
            Role::Superadmin | Role::Admin1 | Role::Admin2 | Role::Admin3 => {
                actor_role.is_superadmin()
            }
            Role::User => actor_role.is_admin(),
        }
    }

    /// Requires the given permission, failing with `PermissionDenied`.
    pub fn require_permission(&self, role: Role, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(role, permission) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{role}' does not have permission '{permission:?}'"
            )))
        }
    }

    /// Requires management rights over the target.
    pub fn require_manage(
        &self,
        actor_role: Role,
        actor_id: Uuid,
        target: &User,
    ) -> Result<(), AppError> {
        if self.can_manage(actor_role, actor_id, target) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{actor_role}' cannot manage users with role '{}'",
                target.role
            )))
        }
    }

    /// Requires view rights over the target.
    pub fn require_view(
        &self,
        actor_role: Role,
        actor_id: Uuid,
        target: &User,
    ) -> Result<(), AppError> {
        if self.can_view(actor_role, actor_id, target) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{actor_role}' cannot view users with role '{}'",
                target.role
            )))
        }
    }

    /// Requires role-assignment rights for the target role.
    pub fn require_assign_role(
        &self,
        actor_role: Role,
        target_role: Role,
    ) -> Result<(), AppError> {
        if self.can_assign_role(actor_role, target_role) {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "Role '{actor_role}' cannot assign role '{target_role}'"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn user_with_role(role: Role) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: format!("{}@x.com", role),
            password_hash: "unused".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar_url: None,
            role,
            is_active: true,
            is_verified: true,
            is_locked: false,
            failed_login_attempts: 0,
            locked_until: None,
            last_login_at: None,
            password_changed_at: now,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_assign_role_matrix() {
        let ac = AccessControl::new();

        assert!(!ac.can_assign_role(Role::Admin1, Role::Admin2));
        assert!(ac.can_assign_role(Role::Superadmin, Role::Admin2));
        assert!(ac.can_assign_role(Role::Admin1, Role::User));
        assert!(ac.can_assign_role(Role::Superadmin, Role::User));
        assert!(!ac.can_assign_role(Role::User, Role::User));
        assert!(!ac.can_assign_role(Role::Admin3, Role::Superadmin));
        assert!(ac.can_assign_role(Role::Superadmin, Role::Superadmin));
    }

    #[test]
    fn test_superadmin_manages_everyone_but_other_superadmins() {
        let ac = AccessControl::new();
        let actor = user_with_role(Role::Superadmin);
        let other_superadmin = user_with_role(Role::Superadmin);
        let admin = user_with_role(Role::Admin2);
        let plain = user_with_role(Role::User);

        assert!(ac.can_manage(actor.role, actor.id, &admin));
        assert!(ac.can_manage(actor.role, actor.id, &plain));
        assert!(!ac.can_manage(actor.role, actor.id, &other_superadmin));
        // Self is the exception.
        assert!(ac.can_manage(actor.role, actor.id, &actor));
    }

    #[test]
    fn test_admin_tiers_are_siblings() {
        let ac = AccessControl::new();
        let actor = user_with_role(Role::Admin1);
        let peer = user_with_role(Role::Admin2);
        let plain = user_with_role(Role::User);

        assert!(!ac.can_manage(actor.role, actor.id, &peer));
        assert!(!ac.can_manage(actor.role, actor.id, &actor));
        assert!(ac.can_manage(actor.role, actor.id, &plain));
    }

    #[test]
    fn test_plain_user_manages_only_themself() {
        let ac = AccessControl::new();
        let actor = user_with_role(Role::User);
        let other = user_with_role(Role::User);

        assert!(ac.can_manage(actor.role, actor.id, &actor));
        assert!(!ac.can_manage(actor.role, actor.id, &other));
    }

    #[test]
    fn test_view_matrix() {
        let ac = AccessControl::new();
        let superadmin = user_with_role(Role::Superadmin);
        let admin = user_with_role(Role::Admin3);
        let plain = user_with_role(Role::User);
        let other_plain = user_with_role(Role::User);

        assert!(ac.can_view(superadmin.role, superadmin.id, &admin));
        assert!(ac.can_view(admin.role, admin.id, &plain));
        assert!(ac.can_view(admin.role, admin.id, &admin));
        assert!(!ac.can_view(admin.role, admin.id, &superadmin));
        assert!(ac.can_view(plain.role, plain.id, &plain));
        assert!(!ac.can_view(plain.role, plain.id, &other_plain));
    }

    #[test]
    fn test_require_permission_denies_with_context() {
        let ac = AccessControl::new();
        let err = ac
            .require_permission(Role::User, Permission::ManageUsers)
            .unwrap_err();
        assert_eq!(
            err.kind,
            gatehouse_core::error::ErrorKind::PermissionDenied
        );
        assert!(err.message.contains("user"));
    }
}
