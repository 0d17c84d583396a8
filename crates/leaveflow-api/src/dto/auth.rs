//! Authentication DTOs
//!
//! Request types for login, registration and password changes.

use leaveflow_core::models::UserRole;
use leaveflow_services::Registration;
use serde::Deserialize;
use validator::Validate;

/// Login request
///
/// Not validated: a missing field or a malformed email is just a failed
/// login and answers 401 like a wrong password.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

/// Account creation request (admin only)
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    /// Defaults to employee
    #[serde(default)]
    pub role: Option<UserRole>,

    /// Defaults to the configured grant
    #[validate(range(min = 0, message = "Total leave must not be negative"))]
    pub total_leave: Option<i32>,
}

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            password: req.password,
            role: req.role.unwrap_or_default(),
            total_leave: req.total_leave,
        }
    }
}

/// Password change request
///
/// Matching and length of the new password are checked by the account
/// service so every caller gets the same messages.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    pub new_password: String,

    pub confirm_password: String,
}
