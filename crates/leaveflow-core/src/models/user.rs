//! User model
//!
//! Represents employees and administrators together with their leave balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator: manages employees and sees every request
    Admin,
    /// Employee: files and edits their own requests
    #[default]
    Employee,
}

impl UserRole {
    /// Stable lowercase name, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Employee => "employee",
        }
    }

    /// Check if role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "employee" => Ok(UserRole::Employee),
            other => Err(format!(
                "Invalid role: {other}. Must be one of: admin, employee"
            )),
        }
    }
}

/// User entity
///
/// `remaining_leave` is derived state: it equals `total_leave` minus the
/// days of every live request the user owns. Only the leave lifecycle
/// service writes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique, used for login)
    pub email: String,

    /// Password hash (never expose in API responses)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// User role
    pub role: UserRole,

    /// Days granted per period
    pub total_leave: i32,

    /// Days still available
    pub remaining_leave: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Check if user can perform admin actions
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            name: String::new(),
            email: String::new(),
            password_hash: String::new(),
            role: UserRole::Employee,
            total_leave: 15,
            remaining_leave: 15,
            created_at: Utc::now(),
        }
    }
}

/// Data needed to create a user; the store assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub total_leave: i32,
}

impl NewUser {
    /// Materialize into a full user with a fresh id; the balance starts full
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            total_leave: self.total_leave,
            remaining_leave: self.total_leave,
            created_at: Utc::now(),
        }
    }
}

/// User info for API responses (without sensitive data)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub total_leave: i32,
    pub remaining_leave: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            total_leave: user.total_leave,
            remaining_leave: user.remaining_leave,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self::from(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("Employee".parse::<UserRole>(), Ok(UserRole::Employee));
        assert!("superadmin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Employee.is_admin());
        assert_eq!(UserRole::default(), UserRole::Employee);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            name: "Jane Smith".to_string(),
            email: "jane@leaveflow.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["remainingLeave"], 15);
        assert_eq!(json["role"], "employee");
    }

    #[test]
    fn test_new_user_starts_with_full_balance() {
        let user = NewUser {
            name: "Mike Johnson".to_string(),
            email: "mike@leaveflow.com".to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Employee,
            total_leave: 22,
        }
        .into_user();

        assert_eq!(user.remaining_leave, 22);
        assert_eq!(user.total_leave, 22);
        assert!(!user.id.is_nil());
    }

    #[test]
    fn test_user_info_conversion() {
        let user = User {
            role: UserRole::Admin,
            total_leave: 25,
            remaining_leave: 20,
            ..Default::default()
        };
        let info = UserInfo::from(&user);
        assert_eq!(info.role, UserRole::Admin);
        assert_eq!(info.remaining_leave, 20);
    }
}
