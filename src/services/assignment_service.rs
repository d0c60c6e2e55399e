//! Shift roster: month generation, per-day resolution and admin edits.
//!
//! Every date that reaches the store is a local calendar date; incoming
//! strings go through [`normalize_local_date`] before any comparison.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::models::{
    AssignmentFilter, GenerateMonthRequest, GenerateMonthResponse, SaveAssignmentRequest,
    ShiftAssignment, ShiftType,
};
use crate::repositories::AssignmentRepository;
use crate::services::{audit_service, user_service};
use crate::state::AppState;
use crate::utils::dates::{month_bounds, normalize_local_date};
use crate::utils::AppError;

fn not_found() -> AppError {
    AppError::NotFound("Shift assignment not found".to_string())
}

fn parse_date(raw: &str, state: &AppState) -> Result<NaiveDate, AppError> {
    normalize_local_date(raw, state.config.local_offset)
        .ok_or_else(|| AppError::Validation(format!("Invalid date: '{}'", raw)))
}

/// Default pattern: even days of the month are mornings, odd days nights.
pub fn default_shift_for(date: NaiveDate) -> ShiftType {
    use chrono::Datelike;
    if date.day() % 2 == 0 {
        ShiftType::Morning
    } else {
        ShiftType::Night
    }
}

/// Builds one row per user per day of the month, `None` for an invalid month.
/// Repeated user ids get a single set of rows.
pub fn build_default_month(
    hospital_id: &str,
    user_ids: &[String],
    year: i32,
    month: u32,
) -> Option<Vec<ShiftAssignment>> {
    let (first, last) = month_bounds(year, month)?;
    let days: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();

    let mut seen = HashSet::new();
    Some(
        user_ids
            .iter()
            .filter(|user_id| seen.insert(user_id.as_str()))
            .flat_map(|user_id| {
                days.iter()
                    .map(move |day| ShiftAssignment::new(user_id, hospital_id, *day, default_shift_for(*day)))
            })
            .collect(),
    )
}

/// Generates the default month when the hospital has no rows for it yet.
///
/// Returns the existing rows untouched otherwise. The boolean is true when
/// rows were written by this call.
pub async fn generate_default_month(
    store: &dyn AssignmentRepository,
    hospital_id: &str,
    user_ids: &[String],
    year: i32,
    month: u32,
) -> Result<(Vec<ShiftAssignment>, bool), AppError> {
    let rows = build_default_month(hospital_id, user_ids, year, month)
        .ok_or_else(|| AppError::Validation(format!("Invalid month: {}-{}", year, month)))?;

    let existing = store.list_month(hospital_id, year, month).await?;
    if !existing.is_empty() {
        log::info!(
            "📅 Roster {} {}-{:02} already has {} rows, nothing generated",
            hospital_id, year, month, existing.len()
        );
        return Ok((existing, false));
    }

    if rows.is_empty() {
        return Ok((rows, false));
    }

    match store.insert_many(rows.clone()).await {
        Ok(count) => {
            log::info!("📅 Generated {} roster rows for {} {}-{:02}", count, hospital_id, year, month);
            Ok((rows, true))
        }
        // Lost a race with another generator: the winner's rows are the month
        Err(AppError::Conflict(msg)) => {
            let winner = store.list_month(hospital_id, year, month).await?;
            if winner.is_empty() {
                return Err(AppError::Conflict(msg));
            }
            log::warn!("⚠️  Roster {} {}-{:02} was generated concurrently", hospital_id, year, month);
            Ok((winner, false))
        }
        Err(e) => Err(e),
    }
}

/// REST entry point: defaults the user set to the hospital's staff.
pub async fn generate_month(
    state: &AppState,
    actor_id: &str,
    request: &GenerateMonthRequest,
) -> Result<GenerateMonthResponse, AppError> {
    if state.hospitals.find_by_id(&request.hospital_id).await?.is_none() {
        return Err(AppError::NotFound("Hospital not found".to_string()));
    }

    let user_ids = match &request.user_ids {
        Some(ids) => {
            for id in ids {
                let member = state.users.find_by_id(id).await?;
                if member.and_then(|u| u.hospital_id).as_deref() != Some(request.hospital_id.as_str()) {
                    return Err(AppError::Validation(format!(
                        "User {} does not belong to hospital {}",
                        id, request.hospital_id
                    )));
                }
            }
            ids.clone()
        }
        None => user_service::staff_ids(state, &request.hospital_id).await?,
    };

    let (assignments, generated) = generate_default_month(
        state.assignments.as_ref(),
        &request.hospital_id,
        &user_ids,
        request.year,
        request.month,
    )
    .await?;

    if generated {
        let summary = serde_json::json!({ "year": request.year, "month": request.month, "rows": assignments.len() });
        audit_service::record(state, Some(actor_id), "generate", "roster_month", Some(&request.hospital_id), None::<&()>, Some(&summary)).await;
    }

    Ok(GenerateMonthResponse {
        hospital_id: request.hospital_id.clone(),
        year: request.year,
        month: request.month,
        generated,
        count: assignments.len(),
        assignments,
    })
}

/// Assignment of a user at a hospital on a day, or `None`.
///
/// `date` may be `YYYY-MM-DD` or a timestamp; both are reduced to the local
/// calendar date before matching.
pub async fn resolve_assignment(
    store: &dyn AssignmentRepository,
    offset: chrono::FixedOffset,
    user_id: &str,
    hospital_id: &str,
    date: &str,
) -> Result<Option<ShiftAssignment>, AppError> {
    let day = normalize_local_date(date, offset)
        .ok_or_else(|| AppError::Validation(format!("Invalid date: '{}'", date)))?;

    let mut rows = store.find_for(user_id, hospital_id, day).await?;
    if rows.len() > 1 {
        log::warn!(
            "⚠️  {} roster rows for user {} at {} on {}, using the first",
            rows.len(), user_id, hospital_id, day
        );
    }

    Ok(if rows.is_empty() { None } else { Some(rows.swap_remove(0)) })
}

pub async fn resolve(
    state: &AppState,
    user_id: &str,
    hospital_id: &str,
    date: &str,
) -> Result<Option<ShiftAssignment>, AppError> {
    resolve_assignment(state.assignments.as_ref(), state.config.local_offset, user_id, hospital_id, date).await
}

/// Upsert keyed by (user, hospital, date). Returns the row and whether it was created.
pub async fn save_assignment(
    state: &AppState,
    actor_id: &str,
    request: &SaveAssignmentRequest,
) -> Result<(ShiftAssignment, bool), AppError> {
    if request.user_id.trim().is_empty() || request.hospital_id.trim().is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }
    let date = parse_date(&request.date, state)?;

    if state.hospitals.find_by_id(&request.hospital_id).await?.is_none() {
        return Err(AppError::Validation(format!("Unknown hospital: {}", request.hospital_id)));
    }

    let existing = state
        .assignments
        .find_for(&request.user_id, &request.hospital_id, date)
        .await?
        .into_iter()
        .next();

    match existing {
        Some(before) => {
            let mut row = before.clone();
            row.shift = request.shift;
            row.manually_assigned = request.manually_assigned.unwrap_or(true);
            if request.roster_id.is_some() {
                row.roster_id = request.roster_id.clone();
            }
            if !state.assignments.update(&row).await? {
                return Err(not_found());
            }
            audit_service::record(state, Some(actor_id), "update", "shift_assignment", Some(&row.id), Some(&before), Some(&row)).await;
            Ok((row, false))
        }
        None => {
            let mut row = ShiftAssignment::new(&request.user_id, &request.hospital_id, date, request.shift);
            row.manually_assigned = request.manually_assigned.unwrap_or(false);
            row.roster_id = request.roster_id.clone();
            let row = state.assignments.insert(row).await?;
            audit_service::record(state, Some(actor_id), "create", "shift_assignment", Some(&row.id), None::<&()>, Some(&row)).await;
            Ok((row, true))
        }
    }
}

/// Admin override of one entry; marks it as manually assigned.
pub async fn override_shift(
    state: &AppState,
    actor_id: &str,
    id: &str,
    shift: ShiftType,
) -> Result<ShiftAssignment, AppError> {
    let before = get_assignment(state, id).await?;
    let mut row = before.clone();
    row.shift = shift;
    row.manually_assigned = true;

    if !state.assignments.update(&row).await? {
        return Err(not_found());
    }
    audit_service::record(state, Some(actor_id), "override", "shift_assignment", Some(id), Some(&before), Some(&row)).await;
    log::info!("✏️  Assignment {} set to {} for user {} on {}", id, shift, row.user_id, row.date);
    Ok(row)
}

pub async fn get_assignment(state: &AppState, id: &str) -> Result<ShiftAssignment, AppError> {
    state.assignments.find_by_id(id).await?.ok_or_else(not_found)
}

pub async fn list_assignments(state: &AppState, filter: &AssignmentFilter) -> Result<Vec<ShiftAssignment>, AppError> {
    state.assignments.list(filter).await
}

pub async fn month_assignments(
    state: &AppState,
    hospital_id: &str,
    year: i32,
    month: u32,
) -> Result<Vec<ShiftAssignment>, AppError> {
    state.assignments.list_month(hospital_id, year, month).await
}

pub async fn delete_assignment(state: &AppState, actor_id: &str, id: &str) -> Result<(), AppError> {
    let row = get_assignment(state, id).await?;
    if !state.assignments.delete(id).await? {
        return Err(not_found());
    }
    audit_service::record(state, Some(actor_id), "delete", "shift_assignment", Some(id), Some(&row), None::<&()>).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::repositories::MemoryRepository;
    use crate::seeds::mock_data_seed::seeded_state;
    use crate::utils::dates::parse_local_offset;

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_generates_users_times_days_once() {
        let store = MemoryRepository::<ShiftAssignment>::new();

        let (rows, generated) = generate_default_month(&store, "hosp-101", &ids(3), 2025, 11).await.unwrap();
        assert!(generated);
        assert_eq!(rows.len(), 3 * 30);

        let (again, generated) = generate_default_month(&store, "hosp-101", &ids(3), 2025, 11).await.unwrap();
        assert!(!generated);
        assert_eq!(again.len(), 90);
        let mut first: Vec<_> = rows.iter().map(|r| r.id.clone()).collect();
        let mut second: Vec<_> = again.iter().map(|r| r.id.clone()).collect();
        first.sort();
        second.sort();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pattern_alternates_and_has_no_off_days() {
        let store = MemoryRepository::<ShiftAssignment>::new();
        let (rows, _) = generate_default_month(&store, "hosp-101", &ids(1), 2024, 2).await.unwrap();
        assert_eq!(rows.len(), 29);

        for row in &rows {
            assert!(!row.manually_assigned);
            assert_ne!(row.shift, ShiftType::Off);
        }
        let on = |d| rows.iter().find(|r| r.date == day(2024, 2, d)).unwrap().shift;
        assert_eq!(on(1), ShiftType::Night);
        assert_eq!(on(2), ShiftType::Morning);
        assert_eq!(on(29), ShiftType::Night);
    }

    #[tokio::test]
    async fn test_existing_rows_block_generation_for_that_month_only() {
        let store = MemoryRepository::<ShiftAssignment>::new();
        store
            .insert(ShiftAssignment::new("9", "hosp-101", day(2025, 12, 31), ShiftType::Off))
            .await
            .unwrap();

        let (rows, generated) = generate_default_month(&store, "hosp-101", &ids(2), 2025, 12).await.unwrap();
        assert!(!generated);
        assert_eq!(rows.len(), 1);

        let (rows, generated) = generate_default_month(&store, "hosp-102", &ids(2), 2025, 12).await.unwrap();
        assert!(generated);
        assert_eq!(rows.len(), 62);
    }

    #[tokio::test]
    async fn test_repeated_user_ids_generate_one_set_each() {
        let store = MemoryRepository::<ShiftAssignment>::new();
        let user_ids: Vec<String> = ["1", "2", "1"].iter().map(|s| s.to_string()).collect();

        let (rows, generated) = generate_default_month(&store, "hosp-101", &user_ids, 2025, 11).await.unwrap();
        assert!(generated);
        assert_eq!(rows.len(), 2 * 30);
        assert_eq!(store.list_month("hosp-101", 2025, 11).await.unwrap().len(), 60);
    }

    #[tokio::test]
    async fn test_invalid_month_is_rejected() {
        let store = MemoryRepository::<ShiftAssignment>::new();
        for month in [0, 13] {
            let err = generate_default_month(&store, "hosp-101", &ids(1), 2025, month).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn test_resolver_normalises_timestamps_to_local_date() {
        let store = MemoryRepository::<ShiftAssignment>::new();
        store
            .insert(ShiftAssignment::new("4", "hosp-101", day(2025, 11, 20), ShiftType::Morning))
            .await
            .unwrap();
        let plus_one = parse_local_offset("+01:00").unwrap();

        for input in ["2025-11-20", "2025-11-19T23:30:00Z", "2025-11-20T08:00:00", "2025-11-20T22:59:00Z"] {
            let found = resolve_assignment(&store, plus_one, "4", "hosp-101", input).await.unwrap();
            assert_eq!(found.map(|a| a.shift), Some(ShiftType::Morning), "input {}", input);
        }

        // 23:30Z on the 20th is already the 21st locally
        let miss = resolve_assignment(&store, plus_one, "4", "hosp-101", "2025-11-20T23:30:00Z").await.unwrap();
        assert!(miss.is_none());
        assert!(resolve_assignment(&store, plus_one, "4", "hosp-102", "2025-11-20").await.unwrap().is_none());
        assert!(resolve_assignment(&store, plus_one, "4", "hosp-101", "tomorrow").await.is_err());
    }

    #[tokio::test]
    async fn test_resolver_returns_first_of_duplicates() {
        // Duplicates can only come from a foreign store; build one directly
        let date = day(2025, 11, 20);
        let first = ShiftAssignment::new("4", "hosp-101", date, ShiftType::Night);
        let second = ShiftAssignment::new("4", "hosp-101", date, ShiftType::Morning);
        let store = MemoryRepository::with_items(vec![first.clone(), second]);

        let found = resolve_assignment(&store, parse_local_offset("").unwrap(), "4", "hosp-101", "2025-11-20")
            .await
            .unwrap();
        assert_eq!(found, Some(first));
    }

    #[tokio::test]
    async fn test_save_is_an_upsert_and_override_flags_row() {
        let state = seeded_state(test_config()).await;
        let request = SaveAssignmentRequest {
            user_id: "2".into(),
            hospital_id: "hosp-101".into(),
            date: "2030-05-10".into(),
            shift: ShiftType::Night,
            manually_assigned: None,
            roster_id: None,
        };

        let (created, was_created) = save_assignment(&state, "admin", &request).await.unwrap();
        assert!(was_created);
        assert!(!created.manually_assigned);

        let request = SaveAssignmentRequest { shift: ShiftType::Off, ..request };
        let (updated, was_created) = save_assignment(&state, "admin", &request).await.unwrap();
        assert!(!was_created);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.shift, ShiftType::Off);
        assert!(updated.manually_assigned);

        let overridden = override_shift(&state, "admin", &created.id, ShiftType::Morning).await.unwrap();
        assert_eq!(overridden.shift, ShiftType::Morning);
        assert!(overridden.manually_assigned);

        let resolved = resolve(&state, "2", "hosp-101", "2030-05-10").await.unwrap().unwrap();
        assert_eq!(resolved.shift, ShiftType::Morning);

        delete_assignment(&state, "admin", &created.id).await.unwrap();
        assert!(resolve(&state, "2", "hosp-101", "2030-05-10").await.unwrap().is_none());
        assert!(matches!(override_shift(&state, "admin", &created.id, ShiftType::Off).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_generate_month_defaults_to_hospital_staff() {
        let state = seeded_state(test_config()).await;
        let response = generate_month(
            &state,
            "admin",
            &GenerateMonthRequest { hospital_id: "hosp-101".into(), year: 2031, month: 4, user_ids: None },
        )
        .await
        .unwrap();

        // Alice, John and Omar are staff at hosp-101; Bob is a manager
        assert!(response.generated);
        assert_eq!(response.count, 3 * 30);
        assert!(response.assignments.iter().all(|a| a.user_id != "5"));

        let month = month_assignments(&state, "hosp-101", 2031, 4).await.unwrap();
        assert_eq!(month.len(), 90);
    }

    #[tokio::test]
    async fn test_generate_month_rejects_outside_users() {
        let state = seeded_state(test_config()).await;
        for ids in [vec!["1".to_string(), "ghost".to_string()], vec!["3".to_string()]] {
            let err = generate_month(
                &state,
                "admin",
                &GenerateMonthRequest { hospital_id: "hosp-101".into(), year: 2031, month: 5, user_ids: Some(ids) },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
        assert!(month_assignments(&state, "hosp-101", 2031, 5).await.unwrap().is_empty());
    }
}
