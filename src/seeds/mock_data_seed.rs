use chrono::{DateTime, Duration, Utc};

use crate::models::{Hospital, Role, ShiftAssignment, ShiftDefinition, ShiftType, User};
use crate::services::auth_service::create_user;
use crate::state::AppState;
use crate::utils::dates::local_date_of;
use crate::utils::AppError;

/// Password of every mock-mode user.
pub const MOCK_PASSWORD: &str = "password123";

const MOCK_PATTERN: [ShiftType; 5] = [
    ShiftType::Morning,
    ShiftType::Night,
    ShiftType::Off,
    ShiftType::Morning,
    ShiftType::Off,
];

fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn mock_hospitals() -> Vec<Hospital> {
    [
        ("hosp-101", "City Hospital", "123 Main St, Cityville", "+1234567890", "2023-01-01T08:00:00Z"),
        ("hosp-102", "Green Valley Hospital", "456 Green Rd, Valleytown", "+1987654321", "2023-02-01T08:00:00Z"),
        ("hosp-103", "Sunrise Medical Center", "789 Sunrise Ave, Sunny City", "+1122334455", "2023-03-01T08:00:00Z"),
    ]
    .into_iter()
    .map(|(id, name, address, contact, created)| Hospital {
        id: id.to_string(),
        name: name.to_string(),
        address: Some(address.to_string()),
        contact: Some(contact.to_string()),
        email: None,
        created_at: at(created),
        updated_at: at(created),
    })
    .collect()
}

/// Sample hospitals, staff, shift definitions and three days of roster rows.
pub async fn seed_mock_data(state: &AppState) -> Result<(), AppError> {
    if !state.hospitals.list().await?.is_empty() {
        log::info!("🌱 Mock data already present, skipping seed");
        return Ok(());
    }

    log::info!("🌱 Seeding mock hospitals, staff and roster...");
    for hospital in mock_hospitals() {
        state.hospitals.insert(hospital).await?;
    }

    let password_hash = bcrypt::hash(MOCK_PASSWORD, state.config.bcrypt_cost)?;
    let now = Utc::now();
    let staff = [
        ("1", "alice@example.com", "Alice Nurse", "hosp-101"),
        ("2", "john.doe@example.com", "John Doe", "hosp-101"),
        ("3", "maria.lopez@example.com", "Maria Lopez", "hosp-102"),
        ("4", "omar.haddad@example.com", "Omar Haddad", "hosp-101"),
    ];
    for (id, email, full_name, hospital_id) in staff {
        state
            .users
            .insert(User {
                id: id.to_string(),
                email: email.to_string(),
                full_name: full_name.to_string(),
                password_hash: password_hash.clone(),
                role: Role::Staff,
                hospital_id: Some(hospital_id.to_string()),
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    state
        .users
        .insert(User {
            id: "5".to_string(),
            email: "bob.manager@example.com".to_string(),
            full_name: "Bob Manager".to_string(),
            password_hash,
            role: Role::Manager,
            hospital_id: Some("hosp-101".to_string()),
            created_at: now,
            updated_at: now,
        })
        .await?;

    for (name, start, end) in [("Morning", "07:00", "15:00"), ("Night", "19:00", "07:00")] {
        state
            .shifts
            .insert(ShiftDefinition {
                id: uuid::Uuid::new_v4().to_string(),
                hospital_id: "hosp-101".to_string(),
                name: name.to_string(),
                start_time: start.to_string(),
                end_time: end.to_string(),
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    let today = local_date_of(now, state.config.local_offset);
    let mut rows = Vec::new();
    for (user_id, hospital_id, shift_base) in [("1", "hosp-101", 0), ("2", "hosp-101", 1), ("3", "hosp-102", 2), ("4", "hosp-101", 3)] {
        for i in 0..3usize {
            let mut row = ShiftAssignment::new(
                user_id,
                hospital_id,
                today + Duration::days(i as i64),
                MOCK_PATTERN[(i + shift_base) % MOCK_PATTERN.len()],
            );
            row.manually_assigned = i == 2 && shift_base < 2;
            rows.push(row);
        }
    }
    let count = state.assignments.insert_many(rows).await?;

    log::info!("   ✅ Seeded 3 hospitals, 5 users, {} roster rows", count);
    Ok(())
}

/// Ensures the configured administrator account exists.
pub async fn seed_admin(state: &AppState) -> Result<(), AppError> {
    let Some((email, password)) = state.config.seed_admin.clone() else {
        return Ok(());
    };

    if state.users.find_by_email(&email.to_lowercase()).await?.is_some() {
        log::info!("👤 Admin {} already exists", email);
        return Ok(());
    }

    let admin = create_user(state, &email, "Administrator", &password, Role::Admin, None).await?;
    log::info!("👤 Seeded admin account {}", admin.email);
    Ok(())
}

#[cfg(test)]
pub async fn seeded_state(config: crate::config::AppConfig) -> AppState {
    let state = AppState::in_memory(config);
    seed_mock_data(&state).await.unwrap();
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let state = seeded_state(test_config()).await;
        seed_mock_data(&state).await.unwrap();
        assert_eq!(state.hospitals.list().await.unwrap().len(), 3);
        assert_eq!(state.users.list(None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_admin_seeded_once() {
        let mut config = test_config();
        config.seed_admin = Some(("Root@Example.com".into(), "adminpw".into()));
        let state = AppState::in_memory(config);

        seed_admin(&state).await.unwrap();
        seed_admin(&state).await.unwrap();

        let admins: Vec<_> = state
            .users
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .filter(|u| u.role == Role::Admin)
            .collect();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "root@example.com");
    }
}
