use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ShiftType;

/// One user's planned shift at one hospital on one local calendar date.
///
/// Unique per (user_id, hospital_id, date).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct ShiftAssignment {
    pub id: String,
    pub user_id: String,
    pub hospital_id: String,
    pub date: NaiveDate,
    pub shift: ShiftType,
    /// true once an admin changed the generated value
    #[serde(default)]
    pub manually_assigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster_id: Option<String>,
}

impl ShiftAssignment {
    pub fn new(user_id: &str, hospital_id: &str, date: NaiveDate, shift: ShiftType) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            hospital_id: hospital_id.to_string(),
            date,
            shift,
            manually_assigned: false,
            roster_id: None,
        }
    }

    pub fn matches(&self, user_id: &str, hospital_id: &str, date: NaiveDate) -> bool {
        self.user_id == user_id && self.hospital_id == hospital_id && self.date == date
    }
}

/// Listing filter; every field is optional and combined with AND
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AssignmentFilter {
    pub user_id: Option<String>,
    pub hospital_id: Option<String>,
    pub roster_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AssignmentFilter {
    pub fn accepts(&self, a: &ShiftAssignment) -> bool {
        self.user_id.as_ref().map_or(true, |u| &a.user_id == u)
            && self.hospital_id.as_ref().map_or(true, |h| &a.hospital_id == h)
            && self.roster_id.as_ref().map_or(true, |r| a.roster_id.as_ref() == Some(r))
            && self.from.map_or(true, |from| a.date >= from)
            && self.to.map_or(true, |to| a.date <= to)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SaveAssignmentRequest {
    pub user_id: String,
    pub hospital_id: String,
    /// YYYY-MM-DD or an RFC 3339 timestamp
    pub date: String,
    pub shift: ShiftType,
    pub manually_assigned: Option<bool>,
    pub roster_id: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct OverrideShiftRequest {
    pub shift: ShiftType,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GenerateMonthRequest {
    pub hospital_id: String,
    pub year: i32,
    pub month: u32,
    /// Defaults to the hospital's staff when omitted
    pub user_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GenerateMonthResponse {
    pub hospital_id: String,
    pub year: i32,
    pub month: u32,
    pub generated: bool,
    pub count: usize,
    pub assignments: Vec<ShiftAssignment>,
}
