use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Named planning period at a hospital, bound to one shift definition
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct Roster {
    pub id: String,
    pub hospital_id: String,
    pub shift_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateRosterRequest {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub hospital_id: String,
    pub shift_id: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRosterRequest {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}
