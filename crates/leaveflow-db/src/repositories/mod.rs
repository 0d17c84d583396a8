//! PostgreSQL repository implementations
//!
//! `PgStore` implements both repository traits defined in leaveflow-core,
//! split across one file per entity.

pub mod leave_repo;
pub mod user_repo;

use sqlx::PgPool;

/// PostgreSQL implementation of `LeaveStore`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Whether a sqlx error is a unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
