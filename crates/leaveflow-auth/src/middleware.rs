//! Actix-web request extractors for the session and the admin gate
//!
//! The session token travels in an http-only cookie set at login; a
//! `Authorization: Bearer` header is accepted as well for API clients.

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use leaveflow_core::models::UserRole;
use leaveflow_core::AppError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "leaveflow_session";

/// Build the cookie that carries a freshly issued session token
pub fn session_cookie(token: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(ttl_secs))
        .finish()
}

/// Cookie that clears the session on the client
pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}

/// Extract the session token from the request
///
/// The Authorization header wins over the cookie.
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Authenticated user extractor
///
/// Resolves the session to a user id. Handlers that need the current balance
/// reload the user from the store; a session whose user has since
/// disappeared is treated as unauthenticated there.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use leaveflow_auth::AuthenticatedUser;
///
/// async fn whoami(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({ "id": user.user_id }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub claims: Claims,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    fn from_claims(claims: Claims) -> Result<Self, AppError> {
        Ok(Self {
            user_id: claims.user_id()?,
            email: claims.email.clone(),
            role: claims.role,
            claims,
        })
    }

    fn authenticate(req: &HttpRequest) -> Result<Self, AppError> {
        let jwt_service = req.app_data::<web::Data<JwtService>>().ok_or_else(|| {
            warn!("JwtService not found in app data");
            AppError::Internal("Authentication service not configured".to_string())
        })?;

        let token = extract_token_from_request(req).ok_or_else(|| {
            debug!("No session token found in request");
            AppError::unauthenticated()
        })?;

        let claims = jwt_service.validate_token(&token)?;
        let user = Self::from_claims(claims)?;

        debug!(user_id = %user.user_id, role = %user.role, "Session authenticated");
        Ok(user)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::authenticate(req))
    }
}

/// Admin gate
///
/// Fails with 401 when there is no valid session and 403 when the session
/// belongs to a non-admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let auth_user = match AuthenticatedUser::authenticate(req) {
            Ok(user) => user,
            Err(e) => return ready(Err(e)),
        };

        if !auth_user.is_admin() {
            warn!(
                user_id = %auth_user.user_id,
                role = %auth_user.role,
                "Non-admin attempted admin access"
            );
            return ready(Err(AppError::Forbidden("Admin access required".to_string())));
        }

        ready(Ok(AdminUser(auth_user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App, HttpResponse};
    use leaveflow_core::models::User;

    const SECRET: &str = "test-secret-key-12345";

    fn user_with_role(role: UserRole) -> User {
        User {
            email: format!("{}@leaveflow.com", role),
            role,
            ..User::default()
        }
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.user_id.to_string())
    }

    async fn admin_only(_admin: AdminUser) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_bearer_header_authenticates() {
        let jwt_service = JwtService::new(SECRET, 3600);
        let user = user_with_role(UserRole::Employee);
        let token = jwt_service.create_token_for_user(&user).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();

        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user.id.to_string());
    }

    #[actix_web::test]
    async fn test_session_cookie_authenticates() {
        let jwt_service = JwtService::new(SECRET, 3600);
        let user = user_with_role(UserRole::Employee);
        let token = jwt_service.create_token_for_user(&user).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .cookie(session_cookie(token, 3600, false))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_missing_and_invalid_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(JwtService::new(SECRET, 3600)))
                .route("/me", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header(("Authorization", "Bearer invalid.token.here"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
    }

    #[actix_web::test]
    async fn test_admin_gate() {
        let jwt_service = JwtService::new(SECRET, 3600);
        let admin_token = jwt_service
            .create_token_for_user(&user_with_role(UserRole::Admin))
            .unwrap();
        let employee_token = jwt_service
            .create_token_for_user(&user_with_role(UserRole::Employee))
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt_service))
                .route("/admin", web::get().to(admin_only)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", admin_token)))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header(("Authorization", format!("Bearer {}", employee_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::get().uri("/admin").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }

    #[actix_web::test]
    async fn test_removal_cookie_expires_session() {
        let cookie = removal_cookie();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
