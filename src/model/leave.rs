use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Monthly,
    Emergency,
    Miscellaneous,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Monthly => "monthly",
            LeaveType::Emergency => "emergency",
            LeaveType::Miscellaneous => "miscellaneous",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Paid,
    Unpaid,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Paid => "paid",
            PaymentType::Unpaid => "unpaid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    pub user_name: String,
    /// Role of the requester at submission time; approval permissions are
    /// checked against this, not against the live user record.
    pub role_id: u8,
    pub leave_type: String,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: String,
    pub payment_type: Option<String>,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<u64>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub approved_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "date-time")]
    pub requested_at: DateTime<Utc>,
}

/// One quota bucket in a monthly balance. `allocated == -1` means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveBucket {
    pub allocated: i32,
    pub used: u32,
    pub pending: u32,
    pub remaining: i32,
}

impl LeaveBucket {
    pub fn limited(allocated: u32, used: u32, pending: u32) -> Self {
        Self {
            allocated: allocated as i32,
            used,
            pending,
            remaining: allocated as i32 - used as i32,
        }
    }

    pub fn unlimited(used: u32, pending: u32) -> Self {
        Self {
            allocated: -1,
            used,
            pending,
            remaining: -1,
        }
    }
}

/// Derived per user per month; recomputed from the leave requests on every
/// read, never stored as a source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    pub monthly: LeaveBucket,
    pub emergency: LeaveBucket,
    pub miscellaneous: LeaveBucket,
}

impl LeaveBalance {
    /// Safe default used when the store is unreachable on the read path.
    pub fn empty(monthly_quota: u32) -> Self {
        Self {
            monthly: LeaveBucket::limited(monthly_quota, 0, 0),
            emergency: LeaveBucket::unlimited(0, 0),
            miscellaneous: LeaveBucket::unlimited(0, 0),
        }
    }
}
