//! LeaveFlow Database Layer
//!
//! This crate provides the storage backends behind the `LeaveStore` trait
//! from leaveflow-core. It includes:
//!
//! - Connection pool management and embedded migrations with sqlx
//! - `PgStore`, the PostgreSQL backend used in production
//! - `MemoryStore`, a process-local backend for development and tests

pub mod memory;
pub mod pool;
pub mod repositories;

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use repositories::PgStore;

// Re-export commonly used types
pub use leaveflow_core::{AppError, AppResult};
pub use sqlx::PgPool;
