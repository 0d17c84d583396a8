//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub leave: LeaveConfig,
    pub notifications: NotificationConfig,
    pub bootstrap: BootstrapConfig,
    pub log: LogConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Directory with the built web client, served at `/` when present
    #[serde(default)]
    pub static_dir: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:5173,http://127.0.0.1:5173".to_string()
}

/// Which persistence backend to run against
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Persistence backend
    #[serde(default)]
    pub backend: StorageBackend,

    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply embedded migrations on startup
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Session token signing secret
    pub jwt_secret: String,

    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: i64,

    /// Mark the session cookie `Secure` (HTTPS only)
    #[serde(default)]
    pub cookie_secure: bool,
}

fn default_session_ttl() -> i64 {
    86_400 // 24 hours
}

/// Leave accounting configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LeaveConfig {
    /// Days granted to new employees when none is given
    #[serde(default = "default_total_leave")]
    pub default_total_leave: i32,
}

fn default_total_leave() -> i32 {
    15
}

/// Chat notification configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    /// Slack bot token
    #[serde(default)]
    pub slack_bot_token: Option<String>,

    /// Slack channel to post into
    #[serde(default)]
    pub slack_channel_id: Option<String>,

    /// Outbound request timeout in seconds
    #[serde(default = "default_notification_timeout")]
    pub timeout_secs: u64,
}

fn default_notification_timeout() -> u64 {
    10
}

impl NotificationConfig {
    /// Token and channel, when both are configured
    pub fn slack_credentials(&self) -> Option<(&str, &str)> {
        let token = self.slack_bot_token.as_deref().filter(|t| !t.is_empty())?;
        let channel = self.slack_channel_id.as_deref().filter(|c| !c.is_empty())?;
        Some((token, channel))
    }
}

/// Admin password used when none is configured
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Accounts created on startup
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapConfig {
    #[serde(default = "default_admin_email")]
    pub admin_email: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    #[serde(default = "default_admin_name")]
    pub admin_name: String,

    #[serde(default = "default_admin_total_leave")]
    pub admin_total_leave: i32,

    /// Also create the demo employee accounts
    #[serde(default)]
    pub seed_demo_accounts: bool,
}

fn default_admin_email() -> String {
    "admin@leaveflow.com".to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

impl BootstrapConfig {
    /// Whether the admin would be created with the well-known password
    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

fn default_admin_name() -> String {
    "Admin User".to_string()
}

fn default_admin_total_leave() -> i32 {
    25
}

/// Log output format
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Self::with_defaults(Config::builder())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with LEAVEFLOW_ prefix
            .add_source(
                Environment::with_prefix("LEAVEFLOW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.run_migrations", true)?
            .set_default("auth.jwt_secret", "")?
            .set_default("auth.session_ttl_secs", 86_400)?
            .set_default("auth.cookie_secure", false)?
            .set_default("leave.default_total_leave", 15)?
            .set_default("notifications.timeout_secs", 10)?
            .set_default("bootstrap.admin_email", "admin@leaveflow.com")?
            .set_default("bootstrap.admin_name", "Admin User")?
            .set_default("bootstrap.admin_password", DEFAULT_ADMIN_PASSWORD)?
            .set_default("bootstrap.admin_total_leave", 25)?
            .set_default("bootstrap.seed_demo_accounts", false)?
            .set_default("log.format", "pretty")
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set (LEAVEFLOW__AUTH__JWT_SECRET)".to_string(),
            ));
        }

        if self.database.backend == StorageBackend::Postgres
            && self.database.url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Message(
                "database.url must be set for the postgres backend (LEAVEFLOW__DATABASE__URL)"
                    .to_string(),
            ));
        }

        if self.leave.default_total_leave < 0 {
            return Err(ConfigError::Message(
                "leave.default_total_leave must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for LeaveConfig {
    fn default() -> Self {
        Self {
            default_total_leave: default_total_leave(),
        }
    }
}
