use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub paid_days_off: i64,
    pub unpaid_days_off: i64,
    pub sick_days_off: i64,
    pub is_deleted: bool,
    pub deleted_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Remaining entitlement for one leave type.
    pub fn balance_of(&self, request_type: crate::database::models::LeaveType) -> i64 {
        use crate::database::models::LeaveType;
        match request_type {
            LeaveType::Paid => self.paid_days_off,
            LeaveType::Unpaid => self.unpaid_days_off,
            LeaveType::SickLeave => self.sick_days_off,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Optional initial team membership.
    pub team_id: Option<Uuid>,
}

/// Combined adjustment of all three counters, applied all-or-nothing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOffDelta {
    pub paid: i64,
    pub unpaid: i64,
    pub sick_leave: i64,
}

/// A snapshot of the three balance counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Balances {
    pub paid_days_off: i64,
    pub unpaid_days_off: i64,
    pub sick_days_off: i64,
}
