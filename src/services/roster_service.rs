use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{CreateRosterRequest, Roster, UpdateRosterRequest};
use crate::services::audit_service;
use crate::state::AppState;
use crate::utils::dates::normalize_local_date;
use crate::utils::AppError;

fn not_found() -> AppError {
    AppError::NotFound("Roster not found".to_string())
}

fn parse_date(state: &AppState, field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    normalize_local_date(raw, state.config.local_offset)
        .ok_or_else(|| AppError::Validation(format!("{} is not a valid date: '{}'", field, raw)))
}

fn check_period(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if end < start {
        return Err(AppError::Validation("end_date must not be before start_date".to_string()));
    }
    Ok(())
}

pub async fn list_rosters(state: &AppState, hospital_id: Option<&str>) -> Result<Vec<Roster>, AppError> {
    let mut rosters = state.rosters.list(hospital_id).await?;
    rosters.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    Ok(rosters)
}

pub async fn get_roster(state: &AppState, id: &str) -> Result<Roster, AppError> {
    state.rosters.find_by_id(id).await?.ok_or_else(not_found)
}

pub async fn create_roster(
    state: &AppState,
    actor_id: &str,
    request: &CreateRosterRequest,
) -> Result<Roster, AppError> {
    if request.name.trim().is_empty() || request.hospital_id.is_empty() || request.shift_id.is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    let start_date = parse_date(state, "start_date", &request.start_date)?;
    let end_date = parse_date(state, "end_date", &request.end_date)?;
    check_period(start_date, end_date)?;

    if state.hospitals.find_by_id(&request.hospital_id).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown hospital: {}", request.hospital_id)));
    }
    let shift = state
        .shifts
        .find_by_id(&request.shift_id)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown shift: {}", request.shift_id)))?;
    if shift.hospital_id != request.hospital_id {
        return Err(AppError::Validation("Shift belongs to another hospital".to_string()));
    }

    let now = Utc::now();
    let roster = state
        .rosters
        .insert(Roster {
            id: Uuid::new_v4().to_string(),
            hospital_id: request.hospital_id.clone(),
            shift_id: request.shift_id.clone(),
            name: request.name.trim().to_string(),
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        })
        .await?;

    audit_service::record(state, Some(actor_id), "create", "roster", Some(&roster.id), None::<&()>, Some(&roster)).await;
    log::info!("📅 Roster '{}' {}..{} created", roster.name, roster.start_date, roster.end_date);
    Ok(roster)
}

pub async fn update_roster(
    state: &AppState,
    actor_id: &str,
    id: &str,
    request: &UpdateRosterRequest,
) -> Result<Roster, AppError> {
    let before = get_roster(state, id).await?;
    let mut roster = before.clone();

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Roster name cannot be empty".to_string()));
        }
        roster.name = name.trim().to_string();
    }
    if let Some(start) = &request.start_date {
        roster.start_date = parse_date(state, "start_date", start)?;
    }
    if let Some(end) = &request.end_date {
        roster.end_date = parse_date(state, "end_date", end)?;
    }
    check_period(roster.start_date, roster.end_date)?;
    roster.updated_at = Utc::now();

    if !state.rosters.update(&roster).await? {
        return Err(not_found());
    }
    audit_service::record(state, Some(actor_id), "update", "roster", Some(id), Some(&before), Some(&roster)).await;
    Ok(roster)
}

pub async fn delete_roster(state: &AppState, actor_id: &str, id: &str) -> Result<(), AppError> {
    let roster = get_roster(state, id).await?;
    state.rosters.delete(id).await?;
    audit_service::record(state, Some(actor_id), "delete", "roster", Some(id), Some(&roster), None::<&()>).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::seeds::mock_data_seed::seeded_state;

    async fn morning_shift_id(state: &AppState) -> String {
        state.shifts.list(Some("hosp-101")).await.unwrap()[0].id.clone()
    }

    #[tokio::test]
    async fn test_period_must_not_end_before_start() {
        let state = seeded_state(test_config()).await;
        let shift_id = morning_shift_id(&state).await;

        let request = CreateRosterRequest {
            name: "December".into(),
            start_date: "2025-12-31".into(),
            end_date: "2025-12-01".into(),
            hospital_id: "hosp-101".into(),
            shift_id: shift_id.clone(),
        };
        assert!(matches!(create_roster(&state, "a", &request).await, Err(AppError::Validation(_))));

        let request = CreateRosterRequest {
            start_date: "2025-12-01".into(),
            end_date: "2025-12-31".into(),
            ..request
        };
        let roster = create_roster(&state, "a", &request).await.unwrap();

        let shrink = UpdateRosterRequest { name: None, start_date: Some("2026-01-05".into()), end_date: None };
        assert!(update_roster(&state, "a", &roster.id, &shrink).await.is_err());
        assert_eq!(get_roster(&state, &roster.id).await.unwrap().start_date.to_string(), "2025-12-01");
    }

    #[tokio::test]
    async fn test_shift_must_belong_to_hospital() {
        let state = seeded_state(test_config()).await;
        let shift_id = morning_shift_id(&state).await;
        let request = CreateRosterRequest {
            name: "Green Valley nights".into(),
            start_date: "2025-12-01".into(),
            end_date: "2025-12-31".into(),
            hospital_id: "hosp-102".into(),
            shift_id,
        };
        assert!(matches!(create_roster(&state, "a", &request).await, Err(AppError::Validation(_))));
    }
}
