//! HTTP request handlers

pub mod admin;
pub mod auth;
pub mod health;
pub mod leave;

use actix_web::web;

/// Configure every route below `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(auth::configure)
        .configure(leave::configure)
        .configure(admin::configure);
}
