//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles available in the system.
///
/// The set is closed: one superadmin tier, three sibling admin tiers, and
/// plain users. Admin tiers are peers of each other — no admin tier
/// outranks another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full system administrator. Manages admins and system settings.
    Superadmin,
    /// First admin tier. Manages plain users.
    Admin1,
    /// Second admin tier. Manages plain users.
    Admin2,
    /// Third admin tier. Manages plain users.
    Admin3,
    /// Regular user. Manages only their own profile.
    User,
}

impl Role {
    /// Check if this role is the superadmin.
    pub fn is_superadmin(&self) -> bool {
        matches!(self, Self::Superadmin)
    }

    /// Check if this role is one of the sibling admin tiers
    /// (superadmin excluded).
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Self::Admin1 | Self::Admin2 | Self::Admin3)
    }

    /// Check if this role has any administrative privileges.
    pub fn is_admin(&self) -> bool {
        self.is_superadmin() || self.is_admin_tier()
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superadmin => "superadmin",
            Self::Admin1 => "admin1",
            Self::Admin2 => "admin2",
            Self::Admin3 => "admin3",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = gatehouse_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "superadmin" => Ok(Self::Superadmin),
            "admin1" => Ok(Self::Admin1),
            "admin2" => Ok(Self::Admin2),
            "admin3" => Ok(Self::Admin3),
            "user" => Ok(Self::User),
            _ => Err(gatehouse_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: superadmin, admin1, admin2, admin3, user"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        assert!(Role::Superadmin.is_superadmin());
        assert!(!Role::Superadmin.is_admin_tier());
        assert!(Role::Admin2.is_admin_tier());
        assert!(Role::Admin2.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("admin3".parse::<Role>().unwrap(), Role::Admin3);
        assert_eq!("SUPERADMIN".parse::<Role>().unwrap(), Role::Superadmin);
        assert!("admin4".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&Role::Superadmin).unwrap(),
            "\"superadmin\""
        );
        assert_eq!(serde_json::to_string(&Role::Admin1).unwrap(), "\"admin1\"");
    }
}
