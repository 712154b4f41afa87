//! User roles.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0} (expected admin, staff or customer)")]
pub struct UserRoleError(pub String);

/// Role assigned to a back-office user.
///
/// Users register without a role; one can be set later through a profile
/// update. Only `Admin` widens access: admins may read and delete other
/// users' inventory and invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access, including other users' records.
    Admin,
    /// Back-office staff working their own inventory.
    Staff,
    /// Regular customer account.
    Customer,
}

impl UserRole {
    /// Whether this role may act on records owned by other users.
    #[must_use]
    pub const fn can_access_all_users(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Staff => write!(f, "staff"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = UserRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "customer" => Ok(Self::Customer),
            other => Err(UserRoleError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_round_trips_display() {
        for role in [UserRole::Admin, UserRole::Staff, UserRole::Customer] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(" Admin ".parse::<UserRole>().unwrap(), UserRole::Admin);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "owner".parse::<UserRole>().unwrap_err();
        assert_eq!(err, UserRoleError("owner".to_owned()));
    }

    #[test]
    fn test_only_admin_crosses_users() {
        assert!(UserRole::Admin.can_access_all_users());
        assert!(!UserRole::Staff.can_access_all_users());
        assert!(!UserRole::Customer.can_access_all_users());
    }
}
