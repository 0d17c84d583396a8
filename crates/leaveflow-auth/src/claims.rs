//! JWT Claims structure
//!
//! Defines the claims carried by a session token.

use chrono::{Duration, Utc};
use leaveflow_core::models::{User, UserRole};
use leaveflow_core::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
///
/// The subject is the user id; email and role are carried for logging and
/// for the admin gate, which needs no store round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Email at the time of login
    pub email: String,

    /// User role
    pub role: UserRole,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for a user; the expiration is filled in by `JwtService`
    ///
    /// # Examples
    ///
    /// ```
    /// use leaveflow_auth::Claims;
    /// use leaveflow_core::models::{User, UserRole};
    ///
    /// let user = User { role: UserRole::Admin, ..User::default() };
    /// let claims = Claims::for_user(&user);
    /// assert_eq!(claims.sub, user.id.to_string());
    /// assert!(claims.is_admin());
    /// ```
    pub fn for_user(user: &User) -> Self {
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: Utc::now().timestamp(),
            exp: 0,
        }
    }

    /// Create claims with an explicit lifetime in seconds
    pub fn with_expiration(user: &User, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in_secs);

        Self {
            exp: exp.timestamp(),
            iat: now.timestamp(),
            ..Self::for_user(user)
        }
    }

    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// Parse the subject back into a user id
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::InvalidToken("Malformed subject".to_string()))
    }

    /// Check if user has admin privileges
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee() -> User {
        User {
            email: "john@leaveflow.com".to_string(),
            ..User::default()
        }
    }

    #[test]
    fn test_claims_for_user() {
        let user = employee();
        let claims = Claims::for_user(&user);
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, "john@leaveflow.com");
        assert_eq!(claims.role, UserRole::Employee);
        assert!(claims.iat > 0);
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_claims_with_expiration() {
        let claims = Claims::with_expiration(&employee(), 3600);
        assert!(!claims.is_expired());

        let now = Utc::now().timestamp();
        assert!(claims.exp > now);
        assert!(claims.exp <= now + 3600);
    }

    #[test]
    fn test_expired_claims() {
        let claims = Claims::with_expiration(&employee(), -60);
        assert!(claims.is_expired());
    }

    #[test]
    fn test_malformed_subject() {
        let mut claims = Claims::for_user(&employee());
        claims.sub = "not-a-uuid".to_string();
        assert!(matches!(claims.user_id(), Err(AppError::InvalidToken(_))));
    }
}
