//! Aggregation service for the admin dashboard

use chrono::{Datelike, NaiveDate, Utc};
use leaveflow_core::{
    models::{LeaveRequest, LeaveStatus, User, UserRole},
    traits::LeaveStore,
    AppResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Admin dashboard statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    /// Users with the employee role
    pub total_employees: i64,

    /// Approved requests whose range contains the reference date
    pub on_leave_today: i64,

    /// Approved days of requests starting in the reference month
    pub this_month: i64,
}

/// Compute the dashboard figures for `reference_date`
pub fn compute_admin_stats(
    users: &[User],
    requests: &[LeaveRequest],
    reference_date: NaiveDate,
) -> AdminStats {
    let total_employees = users
        .iter()
        .filter(|u| u.role == UserRole::Employee)
        .count() as i64;

    let on_leave_today = requests.iter().filter(|r| r.covers(reference_date)).count() as i64;

    let this_month = requests
        .iter()
        .filter(|r| r.status == LeaveStatus::Approved)
        .filter(|r| {
            r.start_date.year() == reference_date.year()
                && r.start_date.month() == reference_date.month()
        })
        .map(|r| i64::from(r.days))
        .sum();

    AdminStats {
        total_employees,
        on_leave_today,
        this_month,
    }
}

/// Reads users and requests from the store and aggregates them
pub struct StatsService {
    store: Arc<dyn LeaveStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    /// Statistics for the current UTC calendar date
    pub async fn admin_stats(&self) -> AppResult<AdminStats> {
        self.admin_stats_on(Utc::now().date_naive()).await
    }

    #[instrument(skip(self))]
    pub async fn admin_stats_on(&self, reference_date: NaiveDate) -> AppResult<AdminStats> {
        let employees = self.store.list_employees().await?;
        let requests: Vec<LeaveRequest> = self
            .store
            .list_all_requests_with_owner()
            .await?
            .into_iter()
            .map(|r| r.request)
            .collect();

        let stats = compute_admin_stats(&employees, &requests, reference_date);
        debug!(?stats, "Computed admin stats");
        Ok(stats)
    }

    /// Users with the employee role
    pub async fn employees(&self) -> AppResult<Vec<User>> {
        self.store.list_employees().await
    }
}
