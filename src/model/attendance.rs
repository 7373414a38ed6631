use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Outcome of the geofence/IP check attached to a clock-in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum VerificationStatus {
    Verified,
    #[strum(serialize = "Location Mismatch")]
    #[serde(rename = "Location Mismatch")]
    LocationMismatch,
    #[strum(serialize = "IP Mismatch")]
    #[serde(rename = "IP Mismatch")]
    IpMismatch,
    #[strum(serialize = "Pending Review")]
    #[serde(rename = "Pending Review")]
    PendingReview,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "Verified",
            VerificationStatus::LocationMismatch => "Location Mismatch",
            VerificationStatus::IpMismatch => "IP Mismatch",
            VerificationStatus::PendingReview => "Pending Review",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum OvertimeApproval {
    #[strum(serialize = "N/A")]
    #[serde(rename = "N/A")]
    NotApplicable,
    Pending,
    Approved,
    Rejected,
}

/// One clock-in/clock-out pair for a user on a calendar date. At most one
/// open event (clock_out IS NULL) may exist per user per day; the table
/// enforces it with UNIQUE (user_id, date).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceEvent {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,
    pub clock_in_lat: f64,
    pub clock_in_lng: f64,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub clock_out: Option<NaiveDateTime>,
    pub clock_out_lat: Option<f64>,
    pub clock_out_lng: Option<f64>,
    pub verification_status: String,
    pub matched_office_id: Option<u64>,
    pub device_id: Option<String>,
    pub photo_url: Option<String>,
    pub total_hours: Option<f64>,
    pub regular_hours: Option<f64>,
    pub overtime_hours: Option<f64>,
    pub overtime_approval: String,
    pub overtime_reason: Option<String>,
}

/// Raw row as it comes out of either the current `attendance` table or the
/// legacy `attendance_records` table. Field naming and date storage drifted
/// over time (`user_id` vs `uid`, a date string vs only a creation
/// timestamp); the summarizer normalizes these into one canonical shape at
/// the data-access boundary instead of scattering fallbacks through the
/// business rules.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawAttendanceRow {
    pub user_id: Option<u64>,
    pub uid: Option<u64>,
    pub date: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
}
