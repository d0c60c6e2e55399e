//! Assignment store backed by a spreadsheet web-app endpoint.
//!
//! The endpoint speaks a small JSON protocol: `GET ?resource=roster&action=list`
//! returns `{success, data: [rows]}`, and mutations are `POST`ed as
//! `{resource, action, data, apiKey}`. Rows use camelCase column names and
//! are loosely typed (numeric user ids, timestamps in the date column), so
//! every row goes through [`parse_sheet_row`] before it is trusted.

use async_trait::async_trait;
use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::AssignmentRepository;
use crate::config::SheetsConfig;
use crate::models::{AssignmentFilter, ShiftAssignment, ShiftType};
use crate::utils::dates::normalize_local_date;
use crate::utils::AppError;

const RESOURCE: &str = "roster";

#[derive(Debug, Deserialize)]
struct SheetsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<String>,
}

pub struct SheetsAssignmentStore {
    client: reqwest::Client,
    config: SheetsConfig,
    offset: FixedOffset,
}

impl SheetsAssignmentStore {
    pub fn new(config: SheetsConfig, offset: FixedOffset) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            offset,
        }
    }

    async fn fetch_rows(&self) -> Result<Vec<ShiftAssignment>, AppError> {
        let url = format!(
            "{}?resource={}&action=list&apiKey={}",
            self.config.api_url,
            RESOURCE,
            urlencoding::encode(&self.config.api_key)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(Duration::from_secs(15))
            .send()
            .await?;
        let body = self.read_body(response).await?;

        let rows = match body {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                return Err(AppError::UpstreamError(format!(
                    "Roster sheet returned unexpected data: {}",
                    other
                )))
            }
        };

        let total = rows.len();
        let parsed: Vec<ShiftAssignment> = rows
            .iter()
            .filter_map(|row| parse_sheet_row(row, self.offset))
            .collect();
        if parsed.len() < total {
            log::warn!("⚠️  Skipped {} unreadable roster rows", total - parsed.len());
        }
        Ok(parsed)
    }

    async fn post(&self, action: &str, data: Value) -> Result<Value, AppError> {
        let payload = json!({
            "resource": RESOURCE,
            "action": action,
            "data": data,
            "apiKey": self.config.api_key,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&payload)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;
        self.read_body(response).await
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Value, AppError> {
        if !response.status().is_success() {
            return Err(AppError::UpstreamError(format!(
                "Roster sheet error: {}",
                response.status()
            )));
        }
        let body: SheetsResponse = response.json().await?;
        if !body.success {
            return Err(AppError::UpstreamError(
                body.error.unwrap_or_else(|| "Roster sheet rejected the request".to_string()),
            ));
        }
        Ok(body.data)
    }
}

/// Reads one sheet row, or `None` when a required column is missing or
/// unparseable. The date column is normalised to a local calendar date.
pub fn parse_sheet_row(row: &Value, offset: FixedOffset) -> Option<ShiftAssignment> {
    let user_id = cell_text(row.get("userId")?)?;
    let hospital_id = cell_text(row.get("hospitalId")?)?;
    let date = normalize_local_date(&cell_text(row.get("date")?)?, offset)?;
    let shift = row
        .get("shift")
        .and_then(cell_text)
        .map(|s| ShiftType::parse(&s))
        .unwrap_or(Some(ShiftType::Off))?;

    let id = row
        .get("id")
        .and_then(cell_text)
        .unwrap_or_else(|| format!("{}:{}:{}", user_id, hospital_id, date));

    let manually_assigned = match row.get("manuallyAssigned") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        Some(Value::Number(n)) => n.as_i64().map_or(false, |n| n != 0),
        _ => false,
    };

    Some(ShiftAssignment {
        id,
        user_id,
        hospital_id,
        date,
        shift,
        manually_assigned,
        roster_id: row.get("rosterId").and_then(cell_text),
    })
}

fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn to_sheet_row(a: &ShiftAssignment) -> Value {
    json!({
        "id": a.id,
        "userId": a.user_id,
        "hospitalId": a.hospital_id,
        "date": a.date.to_string(),
        "shift": a.shift.as_str(),
        "manuallyAssigned": a.manually_assigned,
        "rosterId": a.roster_id,
    })
}

/// Identifies a row by id plus its natural key, so rows stored without an id still match.
fn row_key(a: &ShiftAssignment) -> Value {
    json!({
        "id": a.id,
        "userId": a.user_id,
        "hospitalId": a.hospital_id,
        "date": a.date.to_string(),
    })
}

/// `(hospital, year, month)` when every row belongs to the same hospital month.
fn single_month(rows: &[ShiftAssignment]) -> Option<(&str, i32, u32)> {
    let first = rows.first()?;
    let key = (first.hospital_id.as_str(), first.date.year(), first.date.month());
    rows.iter()
        .all(|a| a.hospital_id == key.0 && a.date.year() == key.1 && a.date.month() == key.2)
        .then_some(key)
}

#[async_trait]
impl AssignmentRepository for SheetsAssignmentStore {
    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<ShiftAssignment>, AppError> {
        let mut rows: Vec<ShiftAssignment> = self
            .fetch_rows()
            .await?
            .into_iter()
            .filter(|a| filter.accepts(a))
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftAssignment>, AppError> {
        Ok(self.fetch_rows().await?.into_iter().find(|a| a.id == id))
    }

    async fn find_for(
        &self,
        user_id: &str,
        hospital_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, AppError> {
        Ok(self
            .fetch_rows()
            .await?
            .into_iter()
            .filter(|a| a.matches(user_id, hospital_id, date))
            .collect())
    }

    async fn insert(&self, assignment: ShiftAssignment) -> Result<ShiftAssignment, AppError> {
        self.post("create", to_sheet_row(&assignment)).await?;
        Ok(assignment)
    }

    async fn insert_many(&self, assignments: Vec<ShiftAssignment>) -> Result<usize, AppError> {
        if let Some((hospital_id, year, month)) = single_month(&assignments) {
            let rows: Vec<Value> = assignments.iter().map(to_sheet_row).collect();
            self.post(
                "replaceRosterMonth",
                json!({ "hospitalId": hospital_id, "year": year, "month": month, "rows": rows }),
            )
            .await?;
            log::info!("📄 Wrote {} roster rows for {} {}-{:02}", rows.len(), hospital_id, year, month);
            return Ok(rows.len());
        }

        for assignment in &assignments {
            self.post("create", to_sheet_row(assignment)).await?;
        }
        Ok(assignments.len())
    }

    async fn update(&self, assignment: &ShiftAssignment) -> Result<bool, AppError> {
        let data = self.post("update", to_sheet_row(assignment)).await?;
        Ok(!data.is_null() && data != Value::Bool(false))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let Some(row) = self.find_by_id(id).await? else {
            return Ok(false);
        };
        let data = self.post("delete", row_key(&row)).await?;
        Ok(data != Value::Bool(false) && !data.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::dates::parse_local_offset;

    #[test]
    fn test_parse_row_with_numeric_user_and_timestamp_date() {
        let offset = parse_local_offset("+01:00").unwrap();
        let row = json!({
            "userId": 4,
            "hospitalId": " hosp-101 ",
            "date": "2025-11-19T23:30:00.000Z",
            "shift": "Night",
            "manuallyAssigned": "TRUE"
        });

        let a = parse_sheet_row(&row, offset).unwrap();
        assert_eq!(a.user_id, "4");
        assert_eq!(a.hospital_id, "hosp-101");
        assert_eq!(a.date, NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
        assert_eq!(a.shift, ShiftType::Night);
        assert!(a.manually_assigned);
        assert_eq!(a.id, "4:hosp-101:2025-11-20");
    }

    #[test]
    fn test_parse_row_rejects_incomplete_rows() {
        let offset = parse_local_offset("").unwrap();
        assert!(parse_sheet_row(&json!({ "hospitalId": "h", "date": "2025-11-01" }), offset).is_none());
        assert!(parse_sheet_row(&json!({ "userId": 1, "hospitalId": "h", "date": "soon" }), offset).is_none());
        assert!(parse_sheet_row(
            &json!({ "userId": 1, "hospitalId": "h", "date": "2025-11-01", "shift": "evening" }),
            offset
        )
        .is_none());

        let blank_shift = json!({ "id": "r1", "userId": "1", "hospitalId": "h", "date": "2025-11-01" });
        assert_eq!(parse_sheet_row(&blank_shift, offset).unwrap().shift, ShiftType::Off);
    }

    #[test]
    fn test_idless_row_key_carries_natural_key() {
        let offset = parse_local_offset("").unwrap();
        let row = json!({ "userId": 9, "hospitalId": "hosp-102", "date": "2025-11-03", "shift": "morning" });
        let a = parse_sheet_row(&row, offset).unwrap();

        let key = row_key(&a);
        assert_eq!(key["id"], "9:hosp-102:2025-11-03");
        assert_eq!(key["userId"], "9");
        assert_eq!(key["hospitalId"], "hosp-102");
        assert_eq!(key["date"], "2025-11-03");

        let sent = to_sheet_row(&a);
        for field in ["userId", "hospitalId", "date"] {
            assert_eq!(sent[field], key[field]);
        }
    }

    #[test]
    fn test_single_month_detection() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let rows = vec![
            ShiftAssignment::new("1", "hosp-101", d(11, 1), ShiftType::Night),
            ShiftAssignment::new("2", "hosp-101", d(11, 30), ShiftType::Morning),
        ];
        assert_eq!(single_month(&rows), Some(("hosp-101", 2025, 11)));

        let mixed = vec![
            ShiftAssignment::new("1", "hosp-101", d(11, 1), ShiftType::Night),
            ShiftAssignment::new("1", "hosp-101", d(12, 1), ShiftType::Night),
        ];
        assert_eq!(single_month(&mixed), None);
        assert_eq!(single_month(&[]), None);
    }
}
