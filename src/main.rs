//! LeaveFlow server
//!
//! Employee leave tracking backend: sessions, leave requests with balance
//! accounting, the admin dashboard and chat notifications.

use actix_cors::Cors;
use actix_web::{http::header, middleware, App, HttpServer};
use anyhow::Context;
use leaveflow_api::AppState;
use leaveflow_core::config::{AppConfig, LogFormat, StorageBackend};
use leaveflow_core::traits::LeaveStore;
use leaveflow_db::{create_pool, run_migrations, MemoryStore, PgStore};
use leaveflow_services::notifier_from_config;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "leaveflow={lvl},leaveflow_api={lvl},leaveflow_services={lvl},leaveflow_db={lvl},leaveflow_auth={lvl},actix_web=info,sqlx=warn",
            lvl = log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
    }
}

/// Build the configured persistence backend
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LeaveStore>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .context("database.url is required for the postgres backend")?;

            info!("Connecting to database...");
            let pool = create_pool(url, Some(config.database.max_connections)).await?;

            if config.database.run_migrations {
                run_migrations(&pool).await?;
            }

            info!(
                "Database connection established with {} max connections",
                config.database.max_connections
            );
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn cors(origins: &str) -> Cors {
    let allowed: Vec<String> = origins
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| allowed.iter().any(|a| a == o))
                .unwrap_or(false)
        })
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::COOKIE,
        ])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(config.log.format);

    info!("Starting LeaveFlow v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config).await?;
    let notifier = notifier_from_config(&config.notifications)?;
    let state = AppState::new(store, notifier, &config.auth, &config.leave);

    state.accounts.bootstrap(&config.bootstrap).await?;

    let static_dir = config
        .server
        .static_dir
        .clone()
        .filter(|dir| Path::new(dir).is_dir());
    match &static_dir {
        Some(dir) => info!("Serving web client from {}", dir),
        None => info!("No web client directory configured; serving the API only"),
    }

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    let cors_origins = config.server.cors_origins.clone();

    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, workers
    );

    HttpServer::new(move || {
        let state = state.clone();
        let mut app = App::new()
            .wrap(cors(&cors_origins))
            .wrap(middleware::Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .configure(move |cfg| state.configure(cfg));

        // Registered last so `/api` keeps precedence
        if let Some(dir) = &static_dir {
            app = app.service(actix_files::Files::new("/", dir).index_file("index.html"));
        }

        app
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await?;

    Ok(())
}
