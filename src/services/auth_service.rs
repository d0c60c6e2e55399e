use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{Role, User, UserInfo};
use crate::state::AppState;
use crate::utils::AppError;

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

impl Claims {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub hospital_id: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

pub fn generate_jwt(user: &User, jwt: &JwtConfig) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        role: user.role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(jwt.ttl_hours)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: jwt.audience.clone(),
        iss: jwt.issuer.clone(),
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt.secret.as_ref()))
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn verify_token(token: &str, jwt: &JwtConfig) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[jwt.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(jwt.issuer.clone());
    validation.iss = Some(issuers);

    decode::<Claims>(token, &DecodingKey::from_secret(jwt.secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Creates a user with a bcrypt hash. Used by registration and admin seeding.
pub async fn create_user(
    state: &AppState,
    email: &str,
    full_name: &str,
    password: &str,
    role: Role,
    hospital_id: Option<String>,
) -> Result<User, AppError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') || full_name.trim().is_empty() || password.is_empty() {
        return Err(AppError::Validation("Missing required fields".to_string()));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    if let Some(hospital_id) = &hospital_id {
        if state.hospitals.find_by_id(hospital_id).await?.is_none() {
            return Err(AppError::Validation(format!("Unknown hospital: {}", hospital_id)));
        }
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        email,
        full_name: full_name.trim().to_string(),
        password_hash: hash(password, state.config.bcrypt_cost)?,
        role,
        hospital_id,
        created_at: now,
        updated_at: now,
    };

    state.users.insert(user).await
}

// Self-registration always yields a STAFF account; roles are granted by admins
pub async fn register(state: &AppState, request: &RegisterRequest) -> Result<AuthResponse, AppError> {
    log::info!("📝 Registering user {}", request.email);

    let user = create_user(
        state,
        &request.email,
        &request.full_name,
        &request.password,
        Role::Staff,
        request.hospital_id.clone(),
    )
    .await?;

    let token = generate_jwt(&user, &state.config.jwt)?;
    log::info!("✅ User registered: {}", user.id);

    Ok(AuthResponse {
        message: "User registered successfully".to_string(),
        token,
        user: user.into(),
    })
}

pub async fn login(state: &AppState, request: &LoginRequest) -> Result<AuthResponse, AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation("Missing email or password".to_string()));
    }

    let user = state
        .users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify(&request.password, &user.password_hash)? {
        log::warn!("🔒 Failed login for {}", user.email);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = generate_jwt(&user, &state.config.jwt)?;
    log::info!("🔑 User logged in: {}", user.id);

    Ok(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    })
}

pub async fn profile(state: &AppState, user_id: &str) -> Result<UserInfo, AppError> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .map(UserInfo::from)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            full_name: "Ana Souza".to_string(),
            password: "s3cret!".to_string(),
            hospital_id: None,
        }
    }

    #[test]
    fn test_jwt_roundtrip_and_audience_check() {
        let config = test_config();
        let now = Utc::now();
        let user = User {
            id: "u-1".into(),
            email: "a@b.c".into(),
            full_name: "A".into(),
            password_hash: String::new(),
            role: Role::Manager,
            hospital_id: None,
            created_at: now,
            updated_at: now,
        };

        let token = generate_jwt(&user, &config.jwt).unwrap();
        let claims = verify_token(&token, &config.jwt).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.role, Role::Manager);
        assert!(claims.has_role(&[Role::Admin, Role::Manager]));

        let mut other = config.jwt.clone();
        other.audience = "someone-else".into();
        assert!(matches!(verify_token(&token, &other), Err(AppError::Unauthorized(_))));

        let mut wrong_secret = config.jwt.clone();
        wrong_secret.secret = "nope".into();
        assert!(verify_token(&token, &wrong_secret).is_err());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let state = AppState::in_memory(test_config());

        let registered = register(&state, &register_request("Ana@Hospital.org")).await.unwrap();
        assert_eq!(registered.user.role, Role::Staff);
        assert_eq!(registered.user.email, "ana@hospital.org");

        let logged_in = login(
            &state,
            &LoginRequest { email: "ana@hospital.org".into(), password: "s3cret!".into() },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let profile = profile(&state, &registered.user.id).await.unwrap();
        assert_eq!(profile.full_name, "Ana Souza");
    }

    #[tokio::test]
    async fn test_duplicate_email_and_bad_password() {
        let state = AppState::in_memory(test_config());
        register(&state, &register_request("dup@hospital.org")).await.unwrap();

        let err = register(&state, &register_request("DUP@hospital.org")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = login(
            &state,
            &LoginRequest { email: "dup@hospital.org".into(), password: "wrong".into() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid credentials"));

        let err = login(
            &state,
            &LoginRequest { email: "ghost@hospital.org".into(), password: "x".into() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_register_requires_fields_and_known_hospital() {
        let state = AppState::in_memory(test_config());
        let mut request = register_request("x@hospital.org");
        request.password = String::new();
        assert!(matches!(register(&state, &request).await, Err(AppError::Validation(_))));

        let mut request = register_request("y@hospital.org");
        request.hospital_id = Some("hosp-999".into());
        assert!(matches!(register(&state, &request).await, Err(AppError::Validation(_))));
    }
}
