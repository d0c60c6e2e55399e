use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ShiftDefinition, UserInfo};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Phone or other contact line
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hospital with the users and shift definitions it owns
#[derive(Debug, Serialize)]
pub struct HospitalDetail {
    #[serde(flatten)]
    pub hospital: Hospital,
    pub users: Vec<UserInfo>,
    pub shifts: Vec<ShiftDefinition>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateHospitalRequest {
    pub name: String,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateHospitalRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
}
