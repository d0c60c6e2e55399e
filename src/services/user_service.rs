use chrono::Utc;

use crate::models::{Role, UpdateUserRequest, UserInfo};
use crate::services::audit_service;
use crate::state::AppState;
use crate::utils::AppError;

pub async fn list_users(state: &AppState, hospital_id: Option<&str>) -> Result<Vec<UserInfo>, AppError> {
    let users = state.users.list(hospital_id).await?;
    Ok(users.into_iter().map(UserInfo::from).collect())
}

pub async fn get_user(state: &AppState, id: &str) -> Result<UserInfo, AppError> {
    state
        .users
        .find_by_id(id)
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Staff of one hospital, the default population for roster generation.
pub async fn staff_ids(state: &AppState, hospital_id: &str) -> Result<Vec<String>, AppError> {
    let users = state.users.list(Some(hospital_id)).await?;
    Ok(users
        .into_iter()
        .filter(|u| u.role == Role::Staff)
        .map(|u| u.id)
        .collect())
}

pub async fn update_user(
    state: &AppState,
    actor_id: &str,
    actor_role: Role,
    id: &str,
    request: &UpdateUserRequest,
) -> Result<UserInfo, AppError> {
    let mut user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let before = UserInfo::from(user.clone());

    if let Some(role) = request.role {
        // Managers cannot mint admins
        if role == Role::Admin && actor_role != Role::Admin {
            return Err(AppError::Forbidden("Insufficient permissions".to_string()));
        }
        user.role = role;
    }
    if let Some(full_name) = &request.full_name {
        if full_name.trim().is_empty() {
            return Err(AppError::Validation("full_name cannot be empty".to_string()));
        }
        user.full_name = full_name.trim().to_string();
    }
    if let Some(email) = &request.email {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(AppError::Validation("Invalid email".to_string()));
        }
        if let Some(existing) = state.users.find_by_email(&email).await? {
            if existing.id != user.id {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }
        user.email = email;
    }
    if let Some(hospital_id) = &request.hospital_id {
        if state.hospitals.find_by_id(hospital_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown hospital: {}", hospital_id)));
        }
        user.hospital_id = Some(hospital_id.clone());
    }
    user.updated_at = Utc::now();

    if !state.users.update(&user).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let info = UserInfo::from(user);
    audit_service::record(state, Some(actor_id), "update", "user", Some(id), Some(&before), Some(&info)).await;
    log::info!("✅ User {} updated", id);
    Ok(info)
}

pub async fn delete_user(state: &AppState, actor_id: &str, id: &str) -> Result<(), AppError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    state.users.delete(id).await?;
    audit_service::record(state, Some(actor_id), "delete", "user", Some(id), Some(&UserInfo::from(user)), None::<&()>).await;
    log::info!("🗑️  User {} deleted", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::services::auth_service::create_user;

    #[tokio::test]
    async fn test_manager_cannot_promote_to_admin() {
        let state = AppState::in_memory(test_config());
        let user = create_user(&state, "s@h.org", "Staff", "pw", Role::Staff, None).await.unwrap();

        let request = UpdateUserRequest { full_name: None, email: None, role: Some(Role::Admin), hospital_id: None };
        let err = update_user(&state, "mgr", Role::Manager, &user.id, &request).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = update_user(&state, "adm", Role::Admin, &user.id, &request).await.unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(state.audit.list(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_staff_ids_filters_role_and_hospital() {
        let state = crate::seeds::mock_data_seed::seeded_state(test_config()).await;
        let ids = staff_ids(&state, "hosp-101").await.unwrap();
        assert!(!ids.is_empty());
        for id in &ids {
            let u = get_user(&state, id).await.unwrap();
            assert_eq!(u.role, Role::Staff);
            assert_eq!(u.hospital_id.as_deref(), Some("hosp-101"));
        }
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let state = AppState::in_memory(test_config());
        assert!(matches!(delete_user(&state, "a", "nope").await, Err(AppError::NotFound(_))));
    }
}
