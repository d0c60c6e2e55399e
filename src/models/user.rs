use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Role {
    #[serde(rename = "STAFF", alias = "staff")]
    Staff,
    /// Hospital administrator.
    #[serde(rename = "MANAGER", alias = "hospital_admin")]
    Manager,
    /// General administrator across all hospitals.
    #[serde(rename = "ADMIN", alias = "general_admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Staff => "STAFF",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User document as stored (collection "users")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,  // PRIMARY IDENTIFIER
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub hospital_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user (never carries the password hash)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub hospital_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            hospital_id: user.hospital_id,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub hospital_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_client_aliases() {
        let role: Role = serde_json::from_str("\"hospital_admin\"").unwrap();
        assert_eq!(role, Role::Manager);
        let role: Role = serde_json::from_str("\"general_admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        let role: Role = serde_json::from_str("\"STAFF\"").unwrap();
        assert_eq!(role, Role::Staff);
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"MANAGER\"");
    }
}
