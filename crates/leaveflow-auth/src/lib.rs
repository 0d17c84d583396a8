//! Authentication and authorization for LeaveFlow
//!
//! This crate provides session tokens (JWT), Argon2 password hashing, and
//! the Actix-web extractors that gate handlers on a valid session or on the
//! admin role.
//!
//! # Examples
//!
//! ```no_run
//! use actix_web::HttpResponse;
//! use leaveflow_auth::{AdminUser, AuthenticatedUser};
//!
//! async fn my_requests(user: AuthenticatedUser) -> HttpResponse {
//!     HttpResponse::Ok().json(serde_json::json!({ "userId": user.user_id }))
//! }
//!
//! async fn stats(_admin: AdminUser) -> HttpResponse {
//!     HttpResponse::Ok().finish()
//! }
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::{
    removal_cookie, session_cookie, AdminUser, AuthenticatedUser, SESSION_COOKIE,
};
pub use password::PasswordService;
