use chrono::Utc;
use uuid::Uuid;

use crate::models::{CreateHospitalRequest, Hospital, HospitalDetail, UpdateHospitalRequest, UserInfo};
use crate::services::audit_service;
use crate::state::AppState;
use crate::utils::AppError;

fn not_found() -> AppError {
    AppError::NotFound("Hospital not found".to_string())
}

fn clean(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_hospitals(state: &AppState) -> Result<Vec<Hospital>, AppError> {
    let mut hospitals = state.hospitals.list().await?;
    hospitals.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(hospitals)
}

/// Hospital together with its users and shift definitions.
pub async fn get_hospital(state: &AppState, id: &str) -> Result<HospitalDetail, AppError> {
    let hospital = state.hospitals.find_by_id(id).await?.ok_or_else(not_found)?;
    let users = state.users.list(Some(id)).await?;
    let shifts = state.shifts.list(Some(id)).await?;

    Ok(HospitalDetail {
        hospital,
        users: users.into_iter().map(UserInfo::from).collect(),
        shifts,
    })
}

pub async fn create_hospital(
    state: &AppState,
    actor_id: &str,
    request: &CreateHospitalRequest,
) -> Result<Hospital, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Hospital name is required".to_string()));
    }

    let now = Utc::now();
    let hospital = state
        .hospitals
        .insert(Hospital {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            address: clean(&request.address),
            contact: clean(&request.contact),
            email: clean(&request.email),
            created_at: now,
            updated_at: now,
        })
        .await?;

    audit_service::record(state, Some(actor_id), "create", "hospital", Some(&hospital.id), None::<&()>, Some(&hospital)).await;
    log::info!("🏥 Hospital created: {} ({})", hospital.name, hospital.id);
    Ok(hospital)
}

pub async fn update_hospital(
    state: &AppState,
    actor_id: &str,
    id: &str,
    request: &UpdateHospitalRequest,
) -> Result<Hospital, AppError> {
    let before = state.hospitals.find_by_id(id).await?.ok_or_else(not_found)?;
    let mut hospital = before.clone();

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Hospital name is required".to_string()));
        }
        hospital.name = name.trim().to_string();
    }
    if request.address.is_some() {
        hospital.address = clean(&request.address);
    }
    if request.contact.is_some() {
        hospital.contact = clean(&request.contact);
    }
    if request.email.is_some() {
        hospital.email = clean(&request.email);
    }
    hospital.updated_at = Utc::now();

    if !state.hospitals.update(&hospital).await? {
        return Err(not_found());
    }
    audit_service::record(state, Some(actor_id), "update", "hospital", Some(id), Some(&before), Some(&hospital)).await;
    Ok(hospital)
}

pub async fn delete_hospital(state: &AppState, actor_id: &str, id: &str) -> Result<(), AppError> {
    let hospital = state.hospitals.find_by_id(id).await?.ok_or_else(not_found)?;
    state.hospitals.delete(id).await?;
    audit_service::record(state, Some(actor_id), "delete", "hospital", Some(id), Some(&hospital), None::<&()>).await;
    log::info!("🗑️  Hospital {} deleted", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::seeds::mock_data_seed::seeded_state;

    #[tokio::test]
    async fn test_detail_includes_users_and_shifts() {
        let state = seeded_state(test_config()).await;
        let detail = get_hospital(&state, "hosp-101").await.unwrap();
        assert_eq!(detail.hospital.name, "City Hospital");
        assert!(detail.users.iter().all(|u| u.hospital_id.as_deref() == Some("hosp-101")));
        assert_eq!(detail.shifts.len(), 2);

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], "hosp-101");
        assert!(json["users"].is_array());
    }

    #[tokio::test]
    async fn test_create_update_delete() {
        let state = AppState::in_memory(test_config());
        let err = create_hospital(
            &state,
            "admin",
            &CreateHospitalRequest { name: "  ".into(), address: None, contact: None, email: None },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = create_hospital(
            &state,
            "admin",
            &CreateHospitalRequest { name: "North Clinic".into(), address: None, contact: Some("+100".into()), email: None },
        )
        .await
        .unwrap();

        let updated = update_hospital(
            &state,
            "admin",
            &created.id,
            &UpdateHospitalRequest { name: None, address: Some("1 North St".into()), contact: None, email: None },
        )
        .await
        .unwrap();
        assert_eq!(updated.address.as_deref(), Some("1 North St"));
        assert_eq!(updated.contact.as_deref(), Some("+100"));

        delete_hospital(&state, "admin", &created.id).await.unwrap();
        assert!(matches!(get_hospital(&state, &created.id).await, Err(AppError::NotFound(_))));
        assert_eq!(state.audit.list(10).await.unwrap().len(), 3);
    }
}
