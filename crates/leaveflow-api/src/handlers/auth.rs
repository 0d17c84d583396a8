//! Authentication handlers
//!
//! Login issues a session cookie; every other route here needs a session.

use crate::dto::{ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest};
use crate::state::SessionSettings;
use actix_web::{web, HttpResponse};
use leaveflow_auth::{removal_cookie, session_cookie, AdminUser, AuthenticatedUser, JwtService};
use leaveflow_core::models::UserInfo;
use leaveflow_core::AppError;
use leaveflow_services::AccountService;
use tracing::{info, instrument};
use validator::Validate;

/// Login endpoint
///
/// POST /api/login
#[instrument(skip_all, fields(email = %req.email))]
pub async fn login(
    accounts: web::Data<AccountService>,
    jwt_service: web::Data<JwtService>,
    session: web::Data<SessionSettings>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let user = accounts.login(req.email.trim(), &req.password).await?;
    let token = jwt_service.create_token_for_user(&user)?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(token, session.ttl_secs, session.cookie_secure))
        .json(UserInfo::from(user)))
}

/// Logout endpoint
///
/// POST /api/logout
pub async fn logout(user: Option<AuthenticatedUser>) -> HttpResponse {
    if let Some(user) = user {
        info!(user_id = %user.user_id, "User logged out");
    }

    HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(MessageResponse::new("Logged out successfully"))
}

/// Current user with a fresh balance
///
/// GET /api/user
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn current_user(
    accounts: web::Data<AccountService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = accounts.current_user(user.user_id).await?;
    Ok(HttpResponse::Ok().json(UserInfo::from(user)))
}

/// Change the caller's password
///
/// POST /api/change-password
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn change_password(
    accounts: web::Data<AccountService>,
    user: AuthenticatedUser,
    req: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    accounts
        .change_password(
            user.user_id,
            &req.current_password,
            &req.new_password,
            &req.confirm_password,
        )
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password changed successfully")))
}

/// Create an account (admin only)
///
/// POST /api/register
#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn register(
    accounts: web::Data<AccountService>,
    admin: AdminUser,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate()?;

    let user = accounts.register(req.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(UserInfo::from(user)))
}

/// Configure authentication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .route("/user", web::get().to(current_user))
        .route("/change-password", web::post().to(change_password))
        .route("/register", web::post().to(register));
}
