//! Balance ledger rules
//!
//! Pure arithmetic over calendar dates and the remaining-leave counter.
//! Callers persist the results.

use chrono::NaiveDate;
use leaveflow_core::{models::User, AppError, AppResult};

/// Inclusive number of calendar days between two dates
///
/// The order of the arguments does not matter: a reversed range counts the
/// same days as the forward one.
///
/// ```
/// use chrono::NaiveDate;
/// use leaveflow_services::ledger::compute_day_span;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
/// assert_eq!(compute_day_span(start, end), 5);
/// assert_eq!(compute_day_span(end, start), 5);
/// assert_eq!(compute_day_span(start, start), 1);
/// ```
pub fn compute_day_span(start_date: NaiveDate, end_date: NaiveDate) -> i32 {
    let days = (end_date - start_date).num_days().abs() + 1;
    i32::try_from(days).unwrap_or(i32::MAX)
}

/// Add `delta_days` to the user's remaining leave
///
/// Negative deltas consume days and fail with `InsufficientBalance` when the
/// counter would drop below zero. Positive deltas restore days and always
/// succeed, even past `total_leave`.
pub fn apply_delta(user: &User, delta_days: i32) -> AppResult<User> {
    let remaining = user.remaining_leave.saturating_add(delta_days);

    if delta_days < 0 && remaining < 0 {
        return Err(AppError::InsufficientBalance {
            remaining: user.remaining_leave,
            requested: delta_days.saturating_neg(),
        });
    }

    Ok(User {
        remaining_leave: remaining,
        ..user.clone()
    })
}
