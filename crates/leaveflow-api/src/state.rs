//! Shared application state
//!
//! Services are built once from the configured collaborators and registered
//! as actix `Data` so handlers can extract exactly what they use.

use crate::handlers;
use actix_web::{web, HttpRequest};
use leaveflow_auth::JwtService;
use leaveflow_core::{
    config::{AuthConfig, LeaveConfig},
    traits::{LeaveStore, Notifier},
    AppError,
};
use leaveflow_services::{AccountService, LeaveService, StatsService};
use std::sync::Arc;
use tracing::debug;

/// Maximum accepted JSON body size
const JSON_LIMIT: usize = 64 * 1024;

/// Session cookie settings
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub ttl_secs: i64,
    pub cookie_secure: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub leave: web::Data<LeaveService>,
    pub accounts: web::Data<AccountService>,
    pub stats: web::Data<StatsService>,
    pub jwt: web::Data<JwtService>,
    pub session: web::Data<SessionSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        notifier: Arc<dyn Notifier>,
        auth: &AuthConfig,
        leave: &LeaveConfig,
    ) -> Self {
        Self {
            leave: web::Data::new(LeaveService::new(store.clone(), notifier)),
            accounts: web::Data::new(AccountService::new(
                store.clone(),
                leave.default_total_leave,
            )),
            stats: web::Data::new(StatsService::new(store)),
            jwt: web::Data::new(JwtService::new(&auth.jwt_secret, auth.session_ttl_secs)),
            session: web::Data::new(SessionSettings {
                ttl_secs: auth.session_ttl_secs,
                cookie_secure: auth.cookie_secure,
            }),
        }
    }

    /// Register services, extractor configs and every `/api` route
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.leave.clone())
            .app_data(self.accounts.clone())
            .app_data(self.stats.clone())
            .app_data(self.jwt.clone())
            .app_data(self.session.clone())
            .app_data(json_config())
            .app_data(path_config())
            .service(web::scope("/api").configure(handlers::configure));
    }
}

/// JSON extractor config turning malformed bodies into validation errors
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, req: &HttpRequest| {
            debug!(path = %req.path(), error = %err, "Rejected JSON body");
            AppError::Validation(format!("Invalid request body: {}", err)).into()
        })
}

/// Path extractor config for malformed identifiers
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        AppError::Validation(format!("Invalid path parameter: {}", err)).into()
    })
}
