//! Role-to-permission mapping.

use serde::{Deserialize, Serialize};

use gatehouse_entity::user::Role;

/// A system-level permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Create, update, lock, and unlock admin-tier accounts.
    ManageAdmins,
    /// Create, update, lock, and unlock plain user accounts.
    ManageUsers,
    /// Query the audit trail.
    ViewAuditLogs,
    /// Change system-wide settings.
    ManageSystemSettings,
    /// View aggregate directory statistics.
    ViewAnalytics,
    /// Assign roles to accounts.
    ManageRoles,
    /// View one's own profile.
    ViewProfile,
    /// Update one's own profile.
    UpdateProfile,
}

/// The total mapping from each role to its permission set.
///
/// The match is exhaustive over the closed `Role` enum, so adding a role
/// without deciding its permissions fails to compile.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Superadmin => &[
            Permission::ManageAdmins,
            Permission::ManageUsers,
            Permission::ViewAuditLogs,
            Permission::ManageSystemSettings,
            Permission::ViewAnalytics,
            Permission::ManageRoles,
        ],
        Role::Admin1 | Role::Admin2 | Role::Admin3 => &[
            Permission::ManageUsers,
            Permission::ViewAuditLogs,
            Permission::ViewAnalytics,
        ],
        Role::User => &[Permission::ViewProfile, Permission::UpdateProfile],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superadmin_has_full_set() {
        let perms = permissions_for(Role::Superadmin);
        assert_eq!(perms.len(), 6);
        assert!(perms.contains(&Permission::ManageAdmins));
        assert!(perms.contains(&Permission::ManageSystemSettings));
    }

    #[test]
    fn test_admin_tiers_share_one_set() {
        for role in [Role::Admin1, Role::Admin2, Role::Admin3] {
            let perms = permissions_for(role);
            assert!(perms.contains(&Permission::ManageUsers));
            assert!(perms.contains(&Permission::ViewAuditLogs));
            assert!(perms.contains(&Permission::ViewAnalytics));
            assert!(!perms.contains(&Permission::ManageAdmins));
            assert!(!perms.contains(&Permission::ManageRoles));
        }
    }

    #[test]
    fn test_plain_user_set() {
        let perms = permissions_for(Role::User);
        assert_eq!(
            perms,
            &[Permission::ViewProfile, Permission::UpdateProfile]
        );
    }
}
