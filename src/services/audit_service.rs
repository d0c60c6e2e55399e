use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::models::AuditEvent;
use crate::state::AppState;
use crate::utils::AppError;

/// Appends an audit event. A failing audit write is logged and swallowed so
/// it never turns a successful mutation into an error.
pub async fn record<B: Serialize, A: Serialize>(
    state: &AppState,
    actor_id: Option<&str>,
    action: &str,
    resource_type: &str,
    resource_id: Option<&str>,
    before: Option<&B>,
    after: Option<&A>,
) {
    let event = AuditEvent {
        id: Uuid::new_v4().to_string(),
        actor_id: actor_id.map(str::to_string),
        action: action.to_string(),
        resource_type: resource_type.to_string(),
        resource_id: resource_id.map(str::to_string),
        timestamp: Utc::now(),
        before: before.and_then(|b| serde_json::to_value(b).ok()),
        after: after.and_then(|a| serde_json::to_value(a).ok()),
    };

    if let Err(e) = state.audit.insert(event).await {
        log::warn!("⚠️  Failed to write audit event {} {}: {}", action, resource_type, e);
    }
}

pub async fn list(state: &AppState, limit: Option<usize>) -> Result<Vec<AuditEvent>, AppError> {
    state.audit.list(limit.unwrap_or(100).clamp(1, 1000)).await
}
