use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ShiftType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceStatus {
    In,
    Out,
}

/// Clock event (collection "attendance")
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub hospital_id: Option<String>,
    pub shift: ShiftType,
    pub status: AttendanceStatus,
    pub timestamp: DateTime<Utc>,
    /// Local calendar day the session started on
    pub local_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AttendanceFilter {
    pub user_id: Option<String>,
    pub hospital_id: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn accepts(&self, r: &AttendanceRecord) -> bool {
        self.user_id.as_ref().map_or(true, |u| &r.user_id == u)
            && self.hospital_id.as_ref().map_or(true, |h| r.hospital_id.as_ref() == Some(h))
            && self.status.map_or(true, |s| r.status == s)
            && self.from.map_or(true, |from| r.local_date >= from)
            && self.to.map_or(true, |to| r.local_date <= to)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ClockRequest {
    /// Defaults to the user's hospital
    pub hospital_id: Option<String>,
    /// Defaults to today's assigned shift
    pub shift: Option<ShiftType>,
    pub qr_token: Option<String>,
}

/// Admin correction of a record
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateAttendanceRequest {
    pub shift: Option<ShiftType>,
    pub timestamp: Option<DateTime<Utc>>,
    pub hospital_id: Option<String>,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AttendanceStatusResponse {
    pub date: NaiveDate,
    pub assigned_shift: Option<ShiftType>,
    pub is_clocked_in: bool,
    pub clock_in_time: Option<DateTime<Utc>>,
    pub clock_out_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub records: Vec<AttendanceRecord>,
}
