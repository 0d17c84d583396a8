//! Leave request handlers
//!
//! Ownership checks happen in `LeaveService`; the handlers only resolve the
//! caller from the session.

use crate::dto::{LeaveRequestBody, MessageResponse};
use actix_web::{web, HttpResponse};
use leaveflow_auth::{AdminUser, AuthenticatedUser};
use leaveflow_core::AppError;
use leaveflow_services::{Caller, LeaveService};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

fn caller(user: &AuthenticatedUser) -> Caller {
    Caller::new(user.user_id, user.role)
}

/// File a new request for the caller
///
/// POST /api/leave/request
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn create_request(
    service: web::Data<LeaveService>,
    user: AuthenticatedUser,
    body: web::Json<LeaveRequestBody>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let request = service
        .create_request(user.user_id, body.into_inner().into())
        .await?;

    Ok(HttpResponse::Created().json(request))
}

/// The caller's own requests, newest first
///
/// GET /api/leave/mine
#[instrument(skip_all, fields(user_id = %user.user_id))]
pub async fn my_requests(
    service: web::Data<LeaveService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let requests = service.list_for_user(user.user_id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Every request with its owner, for the admin calendar
///
/// GET /api/leave/all
#[instrument(skip_all)]
pub async fn all_requests(
    service: web::Data<LeaveService>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let requests = service.list_all().await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Edit a request (owner or admin)
///
/// PUT /api/leave/{id}
#[instrument(skip(service, user, body), fields(user_id = %user.user_id))]
pub async fn update_request(
    service: web::Data<LeaveService>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
    body: web::Json<LeaveRequestBody>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let updated = service
        .update_request(id.into_inner(), caller(&user), body.into_inner().into())
        .await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Delete a request (owner or admin)
///
/// DELETE /api/leave/{id}
#[instrument(skip(service, user), fields(user_id = %user.user_id))]
pub async fn delete_request(
    service: web::Data<LeaveService>,
    user: AuthenticatedUser,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    service
        .delete_request(id.into_inner(), caller(&user))
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Leave request deleted successfully")))
}

/// Configure leave routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            .route("/request", web::post().to(create_request))
            .route("/mine", web::get().to(my_requests))
            .route("/all", web::get().to(all_requests))
            .route("/{id}", web::put().to(update_request))
            .route("/{id}", web::delete().to(delete_request)),
    );
}
