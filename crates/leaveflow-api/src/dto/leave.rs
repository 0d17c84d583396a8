//! Leave request DTOs

use chrono::NaiveDate;
use leaveflow_services::LeaveChanges;
use serde::Deserialize;
use validator::Validate;

/// Body of POST /api/leave/request and PUT /api/leave/{id}
///
/// Dates are ISO calendar dates (`YYYY-MM-DD`). `reason` is required but
/// may be empty; only its length is capped.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestBody {
    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}

impl From<LeaveRequestBody> for LeaveChanges {
    fn from(body: LeaveRequestBody) -> Self {
        Self {
            start_date: body.start_date,
            end_date: body.end_date,
            reason: body.reason,
        }
    }
}
