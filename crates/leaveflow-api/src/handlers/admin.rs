//! Admin dashboard handlers

use actix_web::{web, HttpResponse};
use leaveflow_auth::AdminUser;
use leaveflow_core::models::UserInfo;
use leaveflow_core::AppError;
use leaveflow_services::StatsService;
use tracing::instrument;

/// Employee accounts
///
/// GET /api/admin/employees
#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn employees(
    service: web::Data<StatsService>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let employees: Vec<UserInfo> = service
        .employees()
        .await?
        .into_iter()
        .map(UserInfo::from)
        .collect();

    Ok(HttpResponse::Ok().json(employees))
}

/// Dashboard figures for today (UTC)
///
/// GET /api/admin/stats
#[instrument(skip_all, fields(admin = %admin.user_id))]
pub async fn stats(
    service: web::Data<StatsService>,
    admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(service.admin_stats().await?))
}

/// Configure admin routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/employees", web::get().to(employees))
            .route("/stats", web::get().to(stats)),
    );
}
