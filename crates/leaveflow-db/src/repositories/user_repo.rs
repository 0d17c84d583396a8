//! User repository implementation
//!
//! Provides PostgreSQL-backed storage for accounts and their leave balance.

use super::{is_unique_violation, PgStore};
use async_trait::async_trait;
use leaveflow_core::{
    models::{NewUser, User, UserRole},
    traits::UserRepository,
    AppError, AppResult,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, name, email, password AS password_hash, role,
    total_leave, remaining_leave, created_at
"#;

/// Parse user role from string, treating unknown values as employees
pub(crate) fn parse_role(s: &str) -> UserRole {
    s.parse().unwrap_or(UserRole::Employee)
}

pub(crate) fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: parse_role(row.get("role")),
        total_leave: row.get("total_leave"),
        remaining_leave: row.get("remaining_leave"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self))]
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query(&query)
            .bind(id)
            .map(|row: PgRow| user_from_row(&row))
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                error!("Database error finding user {}: {}", id, e);
                AppError::Database(format!("Failed to find user: {}", e))
            })
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        debug!("Finding user by email: {}", email);

        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query(&query)
            .bind(email)
            .map(|row: PgRow| user_from_row(&row))
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                error!("Database error finding user by email: {}", e);
                AppError::Database(format!("Failed to find user: {}", e))
            })
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let user = user.into_user();
        debug!("Creating user: {}", user.email);

        let query = format!(
            r#"
            INSERT INTO users (
                id, name, email, password, role,
                total_leave, remaining_leave, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.total_leave)
            .bind(user.remaining_leave)
            .bind(user.created_at)
            .map(|row: PgRow| user_from_row(&row))
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::AlreadyExists(format!("Email {} already in use", user.email))
                } else {
                    error!("Database error creating user: {}", e);
                    AppError::Database(format!("Failed to create user: {}", e))
                }
            })
    }

    #[instrument(skip(self))]
    async fn update_user_balance(&self, id: Uuid, remaining_leave: i32) -> AppResult<()> {
        debug!("Setting remaining leave for user {} to {}", id, remaining_leave);

        let result = sqlx::query("UPDATE users SET remaining_leave = $2 WHERE id = $1")
            .bind(id)
            .bind(remaining_leave)
            .execute(self.pool())
            .await
            .map_err(|e| {
                error!("Database error updating balance for user {}: {}", id, e);
                AppError::Database(format!("Failed to update leave balance: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self, password_hash))]
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        debug!("Updating password for user: {}", id);

        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool())
            .await
            .map_err(|e| {
                error!("Database error updating password for user {}: {}", id, e);
                AppError::Database(format!("Failed to update password: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_employees(&self) -> AppResult<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'employee' ORDER BY name, created_at"
        );

        sqlx::query(&query)
            .map(|row: PgRow| user_from_row(&row))
            .fetch_all(self.pool())
            .await
            .map_err(|e| {
                error!("Database error listing employees: {}", e);
                AppError::Database(format!("Failed to fetch employees: {}", e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("admin"), UserRole::Admin);
        assert_eq!(parse_role("employee"), UserRole::Employee);
        assert_eq!(parse_role("invalid"), UserRole::Employee);
    }
}
