//! Request lifecycle service
//!
//! Creates, edits and deletes leave requests while keeping each owner's
//! `remaining_leave` equal to `total_leave` minus the days of their requests:
//! - every read-modify-write of a balance runs under that user's lock
//! - a failed balance write after a successful request write is compensated
//! - the notification for a new request is dispatched on a detached task

use crate::ledger::{apply_delta, compute_day_span};
use crate::notifier::dispatch;
use chrono::NaiveDate;
use leaveflow_core::{
    models::{
        LeaveNotification, LeaveRequest, LeaveRequestWithOwner, NewLeaveRequest, User, UserRole,
    },
    traits::{LeaveStore, Notifier},
    AppError, AppResult,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Editable fields of a leave request
#[derive(Debug, Clone)]
pub struct LeaveChanges {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

/// The caller on whose behalf an edit or delete runs
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Caller {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    fn may_modify(&self, request: &LeaveRequest) -> bool {
        self.role.is_admin() || request.is_owned_by(self.user_id)
    }
}

type LockTable = Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>;

/// Exclusive hold on one user's balance
///
/// Dropping it releases the lock and forgets the table entry once no other
/// task holds or waits on it.
struct UserLock<'a> {
    table: &'a LockTable,
    user_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLock<'_> {
    fn drop(&mut self) {
        self.guard.take();

        // Waiters clone the Arc under the table lock, so a count of one
        // here means the table is the last owner.
        let mut table = self.table.lock();
        if table
            .get(&self.user_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.user_id);
        }
    }
}

/// Request lifecycle service
pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    notifier: Arc<dyn Notifier>,
    user_locks: LockTable,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Serialize balance updates for one user
    async fn lock_user(&self, user_id: Uuid) -> UserLock<'_> {
        let lock = self
            .user_locks
            .lock()
            .entry(user_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        UserLock {
            table: &self.user_locks,
            user_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.user_locks.lock().len()
    }

    async fn load_user(&self, user_id: Uuid) -> AppResult<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    async fn load_request(&self, request_id: Uuid) -> AppResult<LeaveRequest> {
        self.store
            .get_request_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::LeaveRequestNotFound(request_id.to_string()))
    }

    /// Load a request and check the caller may modify it, then take the
    /// owner's lock and re-read the request under it
    async fn authorize(
        &self,
        request_id: Uuid,
        caller: Caller,
        action: &str,
    ) -> AppResult<(LeaveRequest, UserLock<'_>)> {
        let request = self.load_request(request_id).await?;

        if !caller.may_modify(&request) {
            warn!(
                request_id = %request_id,
                caller = %caller.user_id,
                owner = %request.user_id,
                "Caller is not allowed to {} this request", action
            );
            return Err(AppError::Forbidden(format!(
                "Not authorized to {} this request",
                action
            )));
        }

        let guard = self.lock_user(request.user_id).await;
        let request = self.load_request(request_id).await?;
        Ok((request, guard))
    }

    /// File a new request for `user_id`, consuming its days from the balance
    #[instrument(skip(self, changes), fields(start = %changes.start_date, end = %changes.end_date))]
    pub async fn create_request(
        &self,
        user_id: Uuid,
        changes: LeaveChanges,
    ) -> AppResult<LeaveRequest> {
        let _guard = self.lock_user(user_id).await;

        let user = self.load_user(user_id).await?;
        let days = compute_day_span(changes.start_date, changes.end_date);
        let updated_user = apply_delta(&user, -days).map_err(|e| {
            info!(
                user_id = %user_id,
                remaining = user.remaining_leave,
                requested = days,
                "Leave request rejected for insufficient balance"
            );
            e
        })?;

        let request = self
            .store
            .create_request(NewLeaveRequest {
                user_id,
                start_date: changes.start_date,
                end_date: changes.end_date,
                reason: changes.reason,
                days,
            })
            .await?;

        if let Err(e) = self
            .store
            .update_user_balance(user_id, updated_user.remaining_leave)
            .await
        {
            error!(
                error = %e,
                request_id = %request.id,
                "Balance update failed after creating request, removing it"
            );
            if let Err(undo) = self.store.delete_request(request.id).await {
                error!(error = %undo, request_id = %request.id, "Failed to remove orphaned request");
            }
            return Err(e);
        }

        info!(
            request_id = %request.id,
            user_id = %user_id,
            days,
            remaining = updated_user.remaining_leave,
            "Leave request created"
        );

        dispatch(
            self.notifier.clone(),
            LeaveNotification {
                employee_name: updated_user.name.clone(),
                start_date: request.start_date,
                end_date: request.end_date,
                reason: request.reason.clone(),
                days,
                remaining_balance: updated_user.remaining_leave,
            },
        );

        Ok(request)
    }

    /// Edit a request's dates and reason, reconciling the owner's balance
    #[instrument(skip(self, changes), fields(caller = %caller.user_id))]
    pub async fn update_request(
        &self,
        request_id: Uuid,
        caller: Caller,
        changes: LeaveChanges,
    ) -> AppResult<LeaveRequest> {
        let (existing, _guard) = self.authorize(request_id, caller, "update").await?;

        let new_days = compute_day_span(changes.start_date, changes.end_date);
        let delta = existing.days - new_days;

        let owner = self.load_user(existing.user_id).await?;
        let updated_owner = apply_delta(&owner, delta)?;

        let updated = self
            .store
            .update_request(
                request_id,
                changes.start_date,
                changes.end_date,
                &changes.reason,
                new_days,
            )
            .await?;

        if delta != 0 {
            if let Err(e) = self
                .store
                .update_user_balance(owner.id, updated_owner.remaining_leave)
                .await
            {
                error!(
                    error = %e,
                    request_id = %request_id,
                    "Balance update failed after editing request, restoring previous values"
                );
                if let Err(undo) = self
                    .store
                    .update_request(
                        request_id,
                        existing.start_date,
                        existing.end_date,
                        &existing.reason,
                        existing.days,
                    )
                    .await
                {
                    error!(error = %undo, request_id = %request_id, "Failed to restore request");
                }
                return Err(e);
            }
        }

        info!(
            request_id = %request_id,
            old_days = existing.days,
            new_days,
            remaining = updated_owner.remaining_leave,
            "Leave request updated"
        );

        Ok(updated)
    }

    /// Delete a request and give its days back to the owner
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn delete_request(&self, request_id: Uuid, caller: Caller) -> AppResult<()> {
        let (existing, _guard) = self.authorize(request_id, caller, "delete").await?;

        let owner = self.load_user(existing.user_id).await?;
        let restored = apply_delta(&owner, existing.days)?;

        self.store
            .update_user_balance(owner.id, restored.remaining_leave)
            .await?;

        let outcome = match self.store.delete_request(request_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::LeaveRequestNotFound(request_id.to_string())),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            error!(error = %e, request_id = %request_id, "Delete failed, restoring balance");
            if let Err(undo) = self
                .store
                .update_user_balance(owner.id, owner.remaining_leave)
                .await
            {
                error!(error = %undo, user_id = %owner.id, "Failed to restore balance");
            }
            return Err(e);
        }

        info!(
            request_id = %request_id,
            restored_days = existing.days,
            remaining = restored.remaining_leave,
            "Leave request deleted"
        );

        Ok(())
    }

    /// Requests owned by `user_id`, newest first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<LeaveRequest>> {
        self.store.list_requests_for_user(user_id).await
    }

    /// Every request with its owner, newest first
    pub async fn list_all(&self) -> AppResult<Vec<LeaveRequestWithOwner>> {
        self.store.list_all_requests_with_owner().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::LogNotifier;
    use leaveflow_core::models::NewUser;
    use leaveflow_core::traits::{LeaveRequestRepository, UserRepository};
    use leaveflow_db::MemoryStore;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn changes(start: &str, end: &str, reason: &str) -> LeaveChanges {
        LeaveChanges {
            start_date: date(start),
            end_date: date(end),
            reason: reason.to_string(),
        }
    }

    async fn setup() -> (Arc<MemoryStore>, LeaveService) {
        let store = Arc::new(MemoryStore::new());
        let service = LeaveService::new(store.clone(), Arc::new(LogNotifier));
        (store, service)
    }

    async fn employee(store: &MemoryStore, email: &str, total: i32) -> User {
        store
            .create_user(NewUser {
                name: "Test Employee".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Employee,
                total_leave: total,
            })
            .await
            .unwrap()
    }

    async fn remaining(store: &MemoryStore, id: Uuid) -> i32 {
        store.get_user(id).await.unwrap().unwrap().remaining_leave
    }

    #[tokio::test]
    async fn test_create_then_insufficient_balance() {
        let (store, service) = setup().await;
        let user = employee(&store, "john@leaveflow.com", 10).await;

        let request = service
            .create_request(user.id, changes("2024-01-01", "2024-01-05", "Vacation"))
            .await
            .unwrap();
        assert_eq!(request.days, 5);
        assert_eq!(remaining(&store, user.id).await, 5);

        let err = service
            .create_request(user.id, changes("2024-02-01", "2024-02-10", "Too long"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. You have 5 days remaining, but requested 10 days."
        );
        assert_eq!(remaining(&store, user.id).await, 5);
        assert_eq!(store.request_count(), 1);
    }

    #[tokio::test]
    async fn test_create_for_unknown_user() {
        let (_store, service) = setup().await;
        let err = service
            .create_request(Uuid::new_v4(), changes("2024-01-01", "2024-01-01", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_reversed_range_is_accepted() {
        let (store, service) = setup().await;
        let user = employee(&store, "jane@leaveflow.com", 10).await;

        let request = service
            .create_request(user.id, changes("2024-01-05", "2024-01-01", "Backwards"))
            .await
            .unwrap();
        assert_eq!(request.days, 5);
        assert_eq!(request.start_date, date("2024-01-05"));
        assert_eq!(remaining(&store, user.id).await, 5);
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_balance() {
        let (store, service) = setup().await;
        let user = employee(&store, "mike@leaveflow.com", 22).await;

        let request = service
            .create_request(user.id, changes("2024-03-04", "2024-03-08", "Trip"))
            .await
            .unwrap();
        assert_eq!(remaining(&store, user.id).await, 17);

        service
            .delete_request(request.id, Caller::new(user.id, UserRole::Employee))
            .await
            .unwrap();
        assert_eq!(remaining(&store, user.id).await, 22);
        assert_eq!(store.request_count(), 0);
    }

    #[tokio::test]
    async fn test_update_with_same_values_keeps_balance() {
        let (store, service) = setup().await;
        let user = employee(&store, "sarah@leaveflow.com", 19).await;
        let caller = Caller::new(user.id, UserRole::Employee);

        let request = service
            .create_request(user.id, changes("2024-04-01", "2024-04-03", "Rest"))
            .await
            .unwrap();
        let before = remaining(&store, user.id).await;

        let updated = service
            .update_request(request.id, caller, changes("2024-04-01", "2024-04-03", "Rest"))
            .await
            .unwrap();

        assert_eq!(updated, request);
        assert_eq!(remaining(&store, user.id).await, before);
    }

    #[tokio::test]
    async fn test_update_reconciles_balance() {
        let (store, service) = setup().await;
        let user = employee(&store, "john@leaveflow.com", 10).await;
        let caller = Caller::new(user.id, UserRole::Employee);

        let request = service
            .create_request(user.id, changes("2024-01-01", "2024-01-05", "Vacation"))
            .await
            .unwrap();

        let shorter = service
            .update_request(request.id, caller, changes("2024-01-01", "2024-01-02", "Short"))
            .await
            .unwrap();
        assert_eq!(shorter.days, 2);
        assert_eq!(remaining(&store, user.id).await, 8);

        let longer = service
            .update_request(request.id, caller, changes("2024-01-01", "2024-01-10", "Long"))
            .await
            .unwrap();
        assert_eq!(longer.days, 10);
        assert_eq!(remaining(&store, user.id).await, 0);

        let err = service
            .update_request(request.id, caller, changes("2024-01-01", "2024-01-11", "Longer"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::InsufficientBalance {
                remaining: 0,
                requested: 1
            }
        ));
        assert_eq!(remaining(&store, user.id).await, 0);
        let unchanged = store.get_request_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(unchanged.days, 10);
    }

    #[tokio::test]
    async fn test_non_owner_cannot_modify() {
        let (store, service) = setup().await;
        let owner = employee(&store, "owner@leaveflow.com", 10).await;
        let other = employee(&store, "other@leaveflow.com", 10).await;
        let intruder = Caller::new(other.id, UserRole::Employee);

        let request = service
            .create_request(owner.id, changes("2024-01-01", "2024-01-03", "Mine"))
            .await
            .unwrap();

        let err = service
            .update_request(request.id, intruder, changes("2024-01-01", "2024-01-01", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = service.delete_request(request.id, intruder).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        assert_eq!(remaining(&store, owner.id).await, 7);
        assert_eq!(store.request_count(), 1);
    }

    #[tokio::test]
    async fn test_admin_can_modify_any_request() {
        let (store, service) = setup().await;
        let owner = employee(&store, "owner@leaveflow.com", 10).await;
        let admin = Caller::new(Uuid::new_v4(), UserRole::Admin);

        let request = service
            .create_request(owner.id, changes("2024-01-01", "2024-01-03", "Mine"))
            .await
            .unwrap();

        service
            .update_request(request.id, admin, changes("2024-01-01", "2024-01-04", "Admin"))
            .await
            .unwrap();
        assert_eq!(remaining(&store, owner.id).await, 6);

        service.delete_request(request.id, admin).await.unwrap();
        assert_eq!(remaining(&store, owner.id).await, 10);
    }

    #[tokio::test]
    async fn test_missing_request_is_not_found() {
        let (_store, service) = setup().await;
        let caller = Caller::new(Uuid::new_v4(), UserRole::Admin);

        let err = service.delete_request(Uuid::new_v4(), caller).await.unwrap_err();
        assert!(matches!(err, AppError::LeaveRequestNotFound(_)));

        let err = service
            .update_request(Uuid::new_v4(), caller, changes("2024-01-01", "2024-01-01", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LeaveRequestNotFound(_)));
    }

    #[tokio::test]
    async fn test_restoration_can_exceed_total() {
        let (store, service) = setup().await;
        let user = employee(&store, "john@leaveflow.com", 10).await;
        let caller = Caller::new(user.id, UserRole::Employee);

        let request = service
            .create_request(user.id, changes("2024-01-01", "2024-01-05", "Vacation"))
            .await
            .unwrap();

        // An admin grant bump between create and delete is not undone
        store.update_user_balance(user.id, 10).await.unwrap();
        service.delete_request(request.id, caller).await.unwrap();
        assert_eq!(remaining(&store, user.id).await, 15);
    }

    #[tokio::test]
    async fn test_concurrent_creates_do_not_lose_updates() {
        let (store, service) = setup().await;
        let user = employee(&store, "busy@leaveflow.com", 10).await;
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let service = service.clone();
            let user_id = user.id;
            handles.push(tokio::spawn(async move {
                service
                    .create_request(user_id, changes("2024-05-01", "2024-05-03", "Parallel"))
                    .await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 3);
        assert_eq!(remaining(&store, user.id).await, 1);
        assert_eq!(store.request_count(), 3);
        assert_eq!(service.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_lock_entries_are_released() {
        let (store, service) = setup().await;
        let user = employee(&store, "tidy@leaveflow.com", 10).await;

        let created = service
            .create_request(user.id, changes("2024-01-01", "2024-01-02", "Trip"))
            .await
            .unwrap();
        assert_eq!(service.tracked_locks(), 0);

        {
            let _held = service.lock_user(user.id).await;
            assert_eq!(service.tracked_locks(), 1);
        }
        assert_eq!(service.tracked_locks(), 0);

        let caller = Caller::new(user.id, UserRole::Employee);
        service.delete_request(created.id, caller).await.unwrap();
        assert_eq!(service.tracked_locks(), 0);
    }

    #[tokio::test]
    async fn test_lists_are_newest_first() {
        let (store, service) = setup().await;
        let user = employee(&store, "list@leaveflow.com", 20).await;

        service
            .create_request(user.id, changes("2024-01-01", "2024-01-01", "first"))
            .await
            .unwrap();
        service
            .create_request(user.id, changes("2024-02-01", "2024-02-01", "second"))
            .await
            .unwrap();

        let mine = service.list_for_user(user.id).await.unwrap();
        assert_eq!(mine[0].reason, "second");

        let all = service.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].request.reason, "first");
        assert_eq!(all[1].user.id, user.id);
    }
}
