//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockroom_core::{Email, Phone, UserId, UserRole};

/// A back-office user.
///
/// The password hash is deliberately absent; it is only ever read alongside
/// the user by the login path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email (unique).
    pub email: Email,
    /// Phone number (unique).
    pub phone: Phone,
    /// Profile image URL.
    pub image: String,
    /// Optional role; `None` until set through a profile update.
    pub role: Option<UserRole>,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
    /// When the profile was last changed.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether this user may act on records owned by `owner`.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.id == owner || self.role.is_some_and(UserRole::can_access_all_users)
    }
}

/// Input for creating a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub phone: Phone,
    pub password_hash: String,
}

/// Profile fields that may change after registration.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub password_hash: Option<String>,
    pub image: Option<String>,
    pub role: Option<UserRole>,
}

impl ProfileChanges {
    /// Whether no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.password_hash.is_none() && self.image.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(id: i32, role: Option<UserRole>) -> User {
        User {
            id: UserId::new(id),
            name: "Rina".to_string(),
            email: Email::parse("rina@example.com").unwrap(),
            phone: Phone::parse("+8801712345678").unwrap(),
            image: crate::models::DEFAULT_IMAGE_URL.to_string(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_access_own_records_only() {
        let staff = user(1, Some(UserRole::Staff));
        assert!(staff.can_access(UserId::new(1)));
        assert!(!staff.can_access(UserId::new(2)));

        let no_role = user(1, None);
        assert!(!no_role.can_access(UserId::new(2)));
    }

    #[test]
    fn test_admin_can_access_everyone() {
        let admin = user(1, Some(UserRole::Admin));
        assert!(admin.can_access(UserId::new(99)));
    }

    #[test]
    fn test_serializes_camel_case_without_password() {
        let json = serde_json::to_value(user(3, None)).unwrap();
        assert_eq!(json["id"], 3);
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
        assert!(json["role"].is_null());
    }

    #[test]
    fn test_profile_changes_is_empty() {
        assert!(ProfileChanges::default().is_empty());
        let changes = ProfileChanges {
            image: Some("https://img.example.com/a.png".to_string()),
            ..ProfileChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
