//! Leave request model
//!
//! A request reserves an inclusive range of calendar days against its owner's
//! balance. The `days` field caches the span computed at the last write.

use super::user::UserInfo;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Status of a leave request
///
/// Requests are approved the moment they are filed; there is no review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Approved,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Approved => "approved",
        }
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(LeaveStatus::Approved),
            other => Err(format!("Unknown leave status: {other}")),
        }
    }
}

/// Leave request entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    /// Unique identifier
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// First day off (inclusive)
    pub start_date: NaiveDate,

    /// Last day off (inclusive)
    pub end_date: NaiveDate,

    /// Free-text reason
    pub reason: String,

    /// Request status
    pub status: LeaveStatus,

    /// Cached day span of `[start_date, end_date]`
    pub days: i32,

    /// Creation timestamp (immutable)
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Whether the request is approved and its range contains `date`
    ///
    /// Both ends are inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.status == LeaveStatus::Approved && self.start_date <= date && date <= self.end_date
    }

    /// Check whether `user_id` owns this request
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Data needed to file a request; the store assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub days: i32,
}

impl NewLeaveRequest {
    /// Materialize into a full request with a fresh id
    pub fn into_request(self) -> LeaveRequest {
        LeaveRequest {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            status: LeaveStatus::Approved,
            days: self.days,
            created_at: Utc::now(),
        }
    }
}

/// Leave request joined with its owner, for the admin calendar
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaveRequestWithOwner {
    #[serde(flatten)]
    pub request: LeaveRequest,

    pub user: UserInfo,
}

/// Payload handed to the notification collaborator when a request is filed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveNotification {
    pub employee_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub days: i32,
    pub remaining_balance: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(start: &str, end: &str) -> LeaveRequest {
        NewLeaveRequest {
            user_id: Uuid::new_v4(),
            start_date: date(start),
            end_date: date(end),
            reason: "Family trip".to_string(),
            days: 5,
        }
        .into_request()
    }

    #[test]
    fn test_covers_is_inclusive() {
        let req = request("2024-01-01", "2024-01-05");
        assert!(req.covers(date("2024-01-01")));
        assert!(req.covers(date("2024-01-03")));
        assert!(req.covers(date("2024-01-05")));
        assert!(!req.covers(date("2023-12-31")));
        assert!(!req.covers(date("2024-01-06")));
    }

    #[test]
    fn test_wire_format() {
        let req = request("2024-01-01", "2024-01-05");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["startDate"], "2024-01-01");
        assert_eq!(json["endDate"], "2024-01-05");
        assert_eq!(json["status"], "approved");
        assert_eq!(json["days"], 5);
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_with_owner_flattens_request() {
        let owner = User {
            name: "John Employee".to_string(),
            ..Default::default()
        };
        let joined = LeaveRequestWithOwner {
            request: request("2024-03-04", "2024-03-04"),
            user: UserInfo::from(&owner),
        };

        let json = serde_json::to_value(&joined).unwrap();
        assert_eq!(json["startDate"], "2024-03-04");
        assert_eq!(json["user"]["name"], "John Employee");
        assert!(json["user"].get("passwordHash").is_none());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("approved".parse::<LeaveStatus>(), Ok(LeaveStatus::Approved));
        assert!("pending".parse::<LeaveStatus>().is_err());
    }
}
