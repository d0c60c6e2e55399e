use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of shift a user works on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Night,
    Off,
}

impl ShiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftType::Morning => "morning",
            ShiftType::Night => "night",
            ShiftType::Off => "off",
        }
    }

    /// Lenient parser for rows coming from external tabular sources.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(ShiftType::Morning),
            "night" => Some(ShiftType::Night),
            "off" => Some(ShiftType::Off),
            _ => None,
        }
    }

    pub fn is_working(&self) -> bool {
        !matches!(self, ShiftType::Off)
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named working window at a hospital (e.g. "Morning 07:00-15:00")
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct ShiftDefinition {
    pub id: String,
    pub hospital_id: String,
    pub name: String,
    /// HH:MM, local time
    pub start_time: String,
    /// HH:MM, local time; may be earlier than start_time for overnight shifts
    pub end_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateShiftRequest {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub hospital_id: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateShiftRequest {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_type_parse_is_lenient() {
        assert_eq!(ShiftType::parse(" Morning "), Some(ShiftType::Morning));
        assert_eq!(ShiftType::parse("NIGHT"), Some(ShiftType::Night));
        assert_eq!(ShiftType::parse("off"), Some(ShiftType::Off));
        assert_eq!(ShiftType::parse("evening"), None);
        assert!(!ShiftType::Off.is_working());
    }
}
