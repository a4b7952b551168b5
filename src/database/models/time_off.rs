use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub request_type: LeaveType,
    pub reason: String,
    pub start_date: NaiveDate, // inclusive
    pub end_date: NaiveDate,   // inclusive
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields of a request; the type arrives as a string and is parsed
/// by the lifecycle engine so an unknown value surfaces as a validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequestInput {
    pub request_type: String,
    pub reason: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One approver's pending/granted sign-off. Rejection short-circuits the
/// whole request instead of being recorded per row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub id: Uuid,
    pub request_id: Uuid,
    pub approver_id: Uuid,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A request together with its approval rows, ordered by creation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOffRequestDetail {
    #[serde(flatten)]
    pub request: TimeOffRequest,
    pub approvals: Vec<Approval>,
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum LeaveType {
        Paid => "paid",
        Unpaid => "unpaid",
        SickLeave => "sick_leave",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    pub enum RequestStatus {
        Created => "created",
        Awaiting => "awaiting",
        Approved => "approved",
        Rejected => "rejected",
        Canceled => "canceled",
    }
}

impl RequestStatus {
    /// Approved, Rejected and Canceled permit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Rejected | RequestStatus::Canceled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn leave_type_round_trips_through_strings() {
        assert_eq!("sick_leave".parse::<LeaveType>(), Ok(LeaveType::SickLeave));
        assert_eq!(LeaveType::Paid.to_string(), "paid");
        assert!("holiday".parse::<LeaveType>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!RequestStatus::Created.is_terminal());
        assert!(!RequestStatus::Awaiting.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
        assert!(RequestStatus::Canceled.is_terminal());
    }
}
