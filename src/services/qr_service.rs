use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::AppError;

const PREFIX: &str = "ATTENDANCE_";

/// Payload of the QR code a hospital displays for clock-in.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, utoipa::ToSchema)]
pub struct AttendanceTokenPayload {
    pub user_id: String,
    pub hospital_id: String,
    pub timestamp: DateTime<Utc>,
    pub nonce: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct QrTokenResponse {
    pub token: String,
    pub hospital_id: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate_token(user_id: &str, hospital_id: &str, now: DateTime<Utc>) -> Result<String, AppError> {
    let payload = AttendanceTokenPayload {
        user_id: user_id.to_string(),
        hospital_id: hospital_id.to_string(),
        timestamp: now,
        nonce: Uuid::new_v4().simple().to_string()[..10].to_string(),
    };
    let json = serde_json::to_vec(&payload)
        .map_err(|e| AppError::Internal(format!("Failed to encode QR payload: {}", e)))?;

    Ok(format!("{}{}", PREFIX, base64::engine::general_purpose::STANDARD.encode(json)))
}

pub fn decode_token(token: &str) -> Option<AttendanceTokenPayload> {
    let encoded = token.trim().strip_prefix(PREFIX)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Checks format, hospital and age. Tokens dated in the future beyond the
/// TTL are treated as expired too.
pub fn validate_token(
    token: &str,
    hospital_id: &str,
    ttl_secs: i64,
    now: DateTime<Utc>,
) -> Result<AttendanceTokenPayload, AppError> {
    let payload = decode_token(token).ok_or_else(|| AppError::Validation("Invalid QR format".to_string()))?;

    if payload.hospital_id != hospital_id {
        return Err(AppError::Validation("QR code does not belong to this hospital".to_string()));
    }

    let age = (now - payload.timestamp).num_seconds();
    if age.abs() > ttl_secs {
        return Err(AppError::Validation("QR code expired".to_string()));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn message(err: AppError) -> String {
        err.public_message()
    }

    #[test]
    fn test_fresh_token_validates() {
        let now = Utc::now();
        let token = generate_token("5", "hosp-101", now).unwrap();
        assert!(token.starts_with("ATTENDANCE_"));

        let payload = validate_token(&token, "hosp-101", 300, now + Duration::seconds(299)).unwrap();
        assert_eq!(payload.user_id, "5");
        assert_eq!(payload.nonce.len(), 10);
    }

    #[test]
    fn test_rejections() {
        let now = Utc::now();
        let token = generate_token("5", "hosp-101", now).unwrap();

        assert_eq!(message(validate_token("hello", "hosp-101", 300, now).unwrap_err()), "Invalid QR format");
        assert_eq!(
            message(validate_token("ATTENDANCE_!!notbase64", "hosp-101", 300, now).unwrap_err()),
            "Invalid QR format"
        );
        assert_eq!(
            message(validate_token(&token, "hosp-102", 300, now).unwrap_err()),
            "QR code does not belong to this hospital"
        );
        assert_eq!(
            message(validate_token(&token, "hosp-101", 300, now + Duration::seconds(301)).unwrap_err()),
            "QR code expired"
        );
    }
}
