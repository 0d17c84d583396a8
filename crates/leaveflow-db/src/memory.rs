//! In-memory storage backend
//!
//! Keeps users and requests in process memory behind `parking_lot` locks.
//! Used by `database.backend = "memory"` and by the HTTP integration tests.
//! Requests are kept in insertion order so "newest first" is stable even when
//! two rows share a timestamp.

use async_trait::async_trait;
use chrono::NaiveDate;
use leaveflow_core::{
    models::{
        LeaveRequest, LeaveRequestWithOwner, NewLeaveRequest, NewUser, User, UserInfo, UserRole,
    },
    traits::{LeaveRequestRepository, UserRepository},
    AppError, AppResult,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Process-local implementation of `LeaveStore`
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    requests: RwLock<Vec<LeaveRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests
    pub fn request_count(&self) -> usize {
        self.requests.read().len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.write();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::AlreadyExists(format!(
                "Email {} already in use",
                user.email
            )));
        }

        let user = user.into_user();
        debug!("Creating user {} ({})", user.id, user.email);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user_balance(&self, id: Uuid, remaining_leave: i32) -> AppResult<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;
        user.remaining_leave = remaining_leave;
        Ok(())
    }

    async fn update_user_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.write();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_employees(&self) -> AppResult<Vec<User>> {
        let mut employees: Vec<User> = self
            .users
            .read()
            .values()
            .filter(|u| u.role == UserRole::Employee)
            .cloned()
            .collect();
        employees.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(employees)
    }
}

#[async_trait]
impl LeaveRequestRepository for MemoryStore {
    async fn create_request(&self, request: NewLeaveRequest) -> AppResult<LeaveRequest> {
        if !self.users.read().contains_key(&request.user_id) {
            return Err(AppError::UserNotFound(request.user_id.to_string()));
        }

        let request = request.into_request();
        debug!("Creating leave request {}", request.id);
        self.requests.write().push(request.clone());
        Ok(request)
    }

    async fn list_requests_for_user(&self, user_id: Uuid) -> AppResult<Vec<LeaveRequest>> {
        Ok(self
            .requests
            .read()
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all_requests_with_owner(&self) -> AppResult<Vec<LeaveRequestWithOwner>> {
        let users = self.users.read();
        Ok(self
            .requests
            .read()
            .iter()
            .rev()
            .filter_map(|r| {
                users.get(&r.user_id).map(|owner| LeaveRequestWithOwner {
                    request: r.clone(),
                    user: UserInfo::from(owner),
                })
            })
            .collect())
    }

    async fn get_request_by_id(&self, id: Uuid) -> AppResult<Option<LeaveRequest>> {
        Ok(self.requests.read().iter().find(|r| r.id == id).cloned())
    }

    async fn update_request(
        &self,
        id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: &str,
        days: i32,
    ) -> AppResult<LeaveRequest> {
        let mut requests = self.requests.write();
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::LeaveRequestNotFound(id.to_string()))?;

        request.start_date = start_date;
        request.end_date = end_date;
        request.reason = reason.to_string();
        request.days = days;
        Ok(request.clone())
    }

    async fn delete_request(&self, id: Uuid) -> AppResult<bool> {
        let mut requests = self.requests.write();
        let before = requests.len();
        requests.retain(|r| r.id != id);
        Ok(requests.len() < before)
    }
}
