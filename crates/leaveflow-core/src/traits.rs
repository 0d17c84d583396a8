//! Common traits for persistence and notifications
//!
//! Services depend on these abstractions only; the concrete backend is picked
//! once at startup and handed in as `Arc<dyn LeaveStore>`.

use crate::error::AppError;
use crate::models::{
    LeaveNotification, LeaveRequest, LeaveRequestWithOwner, NewLeaveRequest, NewUser, User,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// User storage operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Find user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Create a new user; fails with `AlreadyExists` on a duplicate email
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    /// Overwrite the remaining leave counter
    async fn update_user_balance(&self, id: Uuid, remaining_leave: i32) -> Result<(), AppError>;

    /// Overwrite the stored password hash
    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> Result<(), AppError>;

    /// List users with the employee role
    async fn list_employees(&self) -> Result<Vec<User>, AppError>;
}

/// Leave request storage operations
#[async_trait]
pub trait LeaveRequestRepository: Send + Sync {
    /// Persist a new request
    async fn create_request(&self, request: NewLeaveRequest) -> Result<LeaveRequest, AppError>;

    /// Requests owned by a user, newest first
    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<LeaveRequest>, AppError>;

    /// Every request joined with its owner, newest first
    async fn list_all_requests_with_owner(&self) -> Result<Vec<LeaveRequestWithOwner>, AppError>;

    /// Find request by ID
    async fn get_request_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>, AppError>;

    /// Rewrite the editable fields of a request
    async fn update_request(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
        days: i32,
    ) -> Result<LeaveRequest, AppError>;

    /// Delete a request; returns whether a row was removed
    async fn delete_request(&self, id: Uuid) -> Result<bool, AppError>;
}

/// The persistence collaborator as a single capability set
pub trait LeaveStore: UserRepository + LeaveRequestRepository {}

impl<T: UserRepository + LeaveRequestRepository> LeaveStore for T {}

/// Outbound notice sent when an employee files a request
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the notification; callers treat failures as non-fatal
    async fn leave_requested(&self, notification: &LeaveNotification) -> Result<(), AppError>;
}
