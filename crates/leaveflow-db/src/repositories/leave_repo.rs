//! Leave request repository implementation
//!
//! Provides PostgreSQL-backed storage for leave requests.

use super::user_repo::parse_role;
use super::PgStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use leaveflow_core::{
    models::{LeaveRequest, LeaveRequestWithOwner, LeaveStatus, NewLeaveRequest, UserInfo},
    traits::LeaveRequestRepository,
    AppError, AppResult,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, error, instrument};
use uuid::Uuid;

const REQUEST_COLUMNS: &str =
    "id, user_id, start_date, end_date, reason, status, days, created_at";

fn request_from_row(row: &PgRow) -> LeaveRequest {
    let status: String = row.get("status");
    LeaveRequest {
        id: row.get("id"),
        user_id: row.get("user_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        reason: row.get("reason"),
        status: status.parse().unwrap_or(LeaveStatus::Approved),
        days: row.get("days"),
        created_at: row.get("created_at"),
    }
}

fn request_with_owner_from_row(row: &PgRow) -> LeaveRequestWithOwner {
    LeaveRequestWithOwner {
        request: request_from_row(row),
        user: UserInfo {
            id: row.get("owner_id"),
            name: row.get("owner_name"),
            email: row.get("owner_email"),
            role: parse_role(row.get("owner_role")),
            total_leave: row.get("owner_total_leave"),
            remaining_leave: row.get("owner_remaining_leave"),
            created_at: row.get("owner_created_at"),
        },
    }
}

#[async_trait]
impl LeaveRequestRepository for PgStore {
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    async fn create_request(&self, request: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let request = request.into_request();
        debug!("Creating leave request {}", request.id);

        let query = format!(
            r#"
            INSERT INTO leave_requests (
                id, user_id, start_date, end_date, reason, status, days, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        sqlx::query(&query)
            .bind(request.id)
            .bind(request.user_id)
            .bind(request.start_date)
            .bind(request.end_date)
            .bind(&request.reason)
            .bind(request.status.as_str())
            .bind(request.days)
            .bind(request.created_at)
            .map(|row: PgRow| request_from_row(&row))
            .fetch_one(self.pool())
            .await
            .map_err(|e| {
                error!("Database error creating leave request: {}", e);
                AppError::Database(format!("Failed to create leave request: {}", e))
            })
    }

    #[instrument(skip(self))]
    async fn list_requests_for_user(&self, user_id: Uuid) -> AppResult<Vec<LeaveRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE user_id = $1 ORDER BY created_at DESC"
        );

        sqlx::query(&query)
            .bind(user_id)
            .map(|row: PgRow| request_from_row(&row))
            .fetch_all(self.pool())
            .await
            .map_err(|e| {
                error!("Database error listing requests for user {}: {}", user_id, e);
                AppError::Database(format!("Failed to fetch leave requests: {}", e))
            })
    }

    #[instrument(skip(self))]
    async fn list_all_requests_with_owner(&self) -> AppResult<Vec<LeaveRequestWithOwner>> {
        sqlx::query(
            r#"
            SELECT
                lr.id, lr.user_id, lr.start_date, lr.end_date, lr.reason,
                lr.status, lr.days, lr.created_at,
                u.id AS owner_id,
                u.name AS owner_name,
                u.email AS owner_email,
                u.role AS owner_role,
                u.total_leave AS owner_total_leave,
                u.remaining_leave AS owner_remaining_leave,
                u.created_at AS owner_created_at
            FROM leave_requests lr
            JOIN users u ON u.id = lr.user_id
            ORDER BY lr.created_at DESC
            "#,
        )
        .map(|row: PgRow| request_with_owner_from_row(&row))
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            error!("Database error listing all leave requests: {}", e);
            AppError::Database(format!("Failed to fetch all leave requests: {}", e))
        })
    }

    #[instrument(skip(self))]
    async fn get_request_by_id(&self, id: Uuid) -> AppResult<Option<LeaveRequest>> {
        debug!("Finding leave request by id: {}", id);

        let query = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = $1");
        sqlx::query(&query)
            .bind(id)
            .map(|row: PgRow| request_from_row(&row))
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                error!("Database error finding leave request {}: {}", id, e);
                AppError::Database(format!("Failed to find leave request: {}", e))
            })
    }

    #[instrument(skip(self, reason))]
    async fn update_request(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
        days: i32,
    ) -> AppResult<LeaveRequest> {
        debug!("Updating leave request: {}", id);

        let query = format!(
            r#"
            UPDATE leave_requests
            SET start_date = $2,
                end_date = $3,
                reason = $4,
                days = $5
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        );

        sqlx::query(&query)
            .bind(id)
            .bind(start_date)
            .bind(end_date)
            .bind(reason)
            .bind(days)
            .map(|row: PgRow| request_from_row(&row))
            .fetch_optional(self.pool())
            .await
            .map_err(|e| {
                error!("Database error updating leave request {}: {}", id, e);
                AppError::Database(format!("Failed to update leave request: {}", e))
            })?
            .ok_or_else(|| AppError::LeaveRequestNotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete_request(&self, id: Uuid) -> AppResult<bool> {
        debug!("Deleting leave request: {}", id);

        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| {
                error!("Database error deleting leave request {}: {}", id, e);
                AppError::Database(format!("Failed to delete leave request: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
