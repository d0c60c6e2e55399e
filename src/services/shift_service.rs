use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{CreateShiftRequest, ShiftDefinition, UpdateShiftRequest};
use crate::services::audit_service;
use crate::state::AppState;
use crate::utils::AppError;

fn not_found() -> AppError {
    AppError::NotFound("Shift not found".to_string())
}

/// Accepts `HH:MM` and returns it zero-padded.
fn parse_clock(field: &str, raw: &str) -> Result<String, AppError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppError::Validation(format!("{} must be HH:MM, got '{}'", field, raw)))
}

pub async fn list_shifts(state: &AppState, hospital_id: Option<&str>) -> Result<Vec<ShiftDefinition>, AppError> {
    state.shifts.list(hospital_id).await
}

pub async fn get_shift(state: &AppState, id: &str) -> Result<ShiftDefinition, AppError> {
    state.shifts.find_by_id(id).await?.ok_or_else(not_found)
}

pub async fn create_shift(
    state: &AppState,
    actor_id: &str,
    request: &CreateShiftRequest,
) -> Result<ShiftDefinition, AppError> {
    if request.name.trim().is_empty() || request.hospital_id.trim().is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    let start_time = parse_clock("start_time", &request.start_time)?;
    let end_time = parse_clock("end_time", &request.end_time)?;

    if state.hospitals.find_by_id(&request.hospital_id).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown hospital: {}", request.hospital_id)));
    }

    let now = Utc::now();
    let shift = state
        .shifts
        .insert(ShiftDefinition {
            id: Uuid::new_v4().to_string(),
            hospital_id: request.hospital_id.clone(),
            name: request.name.trim().to_string(),
            start_time,
            end_time,
            created_at: now,
            updated_at: now,
        })
        .await?;

    audit_service::record(state, Some(actor_id), "create", "shift", Some(&shift.id), None::<&()>, Some(&shift)).await;
    Ok(shift)
}

pub async fn update_shift(
    state: &AppState,
    actor_id: &str,
    id: &str,
    request: &UpdateShiftRequest,
) -> Result<ShiftDefinition, AppError> {
    let before = get_shift(state, id).await?;
    let mut shift = before.clone();

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Shift name cannot be empty".to_string()));
        }
        shift.name = name.trim().to_string();
    }
    if let Some(start) = &request.start_time {
        shift.start_time = parse_clock("start_time", start)?;
    }
    if let Some(end) = &request.end_time {
        shift.end_time = parse_clock("end_time", end)?;
    }
    shift.updated_at = Utc::now();

    if !state.shifts.update(&shift).await? {
        return Err(not_found());
    }
    audit_service::record(state, Some(actor_id), "update", "shift", Some(id), Some(&before), Some(&shift)).await;
    Ok(shift)
}

pub async fn delete_shift(state: &AppState, actor_id: &str, id: &str) -> Result<(), AppError> {
    let shift = get_shift(state, id).await?;
    state.shifts.delete(id).await?;
    audit_service::record(state, Some(actor_id), "delete", "shift", Some(id), Some(&shift), None::<&()>).await;
    Ok(())
}
