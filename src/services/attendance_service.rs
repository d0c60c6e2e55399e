//! Clock-in / clock-out recording.
//!
//! A session is keyed by (user, shift, local date of the clock-in). It moves
//! from nothing to IN to IN+OUT and never back; the OUT record carries the
//! worked minutes.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    AttendanceFilter, AttendanceRecord, AttendanceStatus, AttendanceStatusResponse, ClockRequest,
    Role, ShiftType, UpdateAttendanceRequest,
};
use crate::repositories::AttendanceRepository;
use crate::services::auth_service::Claims;
use crate::services::{assignment_service, audit_service, qr_service};
use crate::state::AppState;
use crate::utils::dates::local_date_of;
use crate::utils::AppError;

pub struct AttendanceRecorder {
    repo: Arc<dyn AttendanceRepository>,
    // Serialises check-then-insert so two requests cannot both open a session
    gate: Mutex<()>,
    offset: FixedOffset,
}

impl AttendanceRecorder {
    pub fn new(repo: Arc<dyn AttendanceRepository>, offset: FixedOffset) -> Self {
        Self {
            repo,
            gate: Mutex::new(()),
            offset,
        }
    }

    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        local_date_of(at, self.offset)
    }

    pub async fn clock_in(
        &self,
        user_id: &str,
        hospital_id: Option<&str>,
        shift: ShiftType,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        if !shift.is_working() {
            return Err(AppError::Validation("Cannot clock in for an off shift".to_string()));
        }

        let _guard = self.gate.lock().await;
        let local_date = self.local_date(at);

        let session = self.repo.find_session(user_id, shift, local_date).await?;
        if session.iter().any(|r| r.status == AttendanceStatus::In) {
            return Err(AppError::Conflict("Already clocked in".to_string()));
        }

        let record = self
            .repo
            .insert(AttendanceRecord {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                hospital_id: hospital_id.map(str::to_string),
                shift,
                status: AttendanceStatus::In,
                timestamp: at,
                local_date,
                duration_minutes: None,
            })
            .await?;

        crate::api::metrics::increment_clock_events();
        log::info!("🟢 User {} clocked in for {} shift on {}", user_id, shift, local_date);
        Ok(record)
    }

    pub async fn clock_out(
        &self,
        user_id: &str,
        hospital_id: Option<&str>,
        shift: ShiftType,
        at: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AppError> {
        let _guard = self.gate.lock().await;
        let (session_date, session) = self.session_to_close(user_id, shift, at).await?;

        let clock_in = session
            .iter()
            .find(|r| r.status == AttendanceStatus::In)
            .ok_or_else(|| AppError::NotFound("No active clock-in found".to_string()))?;
        if session.iter().any(|r| r.status == AttendanceStatus::Out) {
            return Err(AppError::Conflict("Already clocked out".to_string()));
        }

        let duration = (at - clock_in.timestamp).num_minutes().max(0);
        let record = self
            .repo
            .insert(AttendanceRecord {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                hospital_id: hospital_id.map(str::to_string).or_else(|| clock_in.hospital_id.clone()),
                shift,
                status: AttendanceStatus::Out,
                timestamp: at,
                local_date: session_date,
                duration_minutes: Some(duration),
            })
            .await?;

        crate::api::metrics::increment_clock_events();
        log::info!("🔴 User {} clocked out of {} shift, {} minutes", user_id, shift, duration);
        Ok(record)
    }

    /// Today's session, or for night shifts an unfinished one that started yesterday.
    async fn session_to_close(
        &self,
        user_id: &str,
        shift: ShiftType,
        at: DateTime<Utc>,
    ) -> Result<(NaiveDate, Vec<AttendanceRecord>), AppError> {
        let today = self.local_date(at);
        let session = self.repo.find_session(user_id, shift, today).await?;
        if session.iter().any(|r| r.status == AttendanceStatus::In) || shift != ShiftType::Night {
            return Ok((today, session));
        }

        if let Some(yesterday) = today.pred_opt() {
            let previous = self.repo.find_session(user_id, shift, yesterday).await?;
            if is_open(&previous) {
                return Ok((yesterday, previous));
            }
        }
        Ok((today, session))
    }

    /// The IN record of the user's unfinished session, if any.
    pub async fn open_session(&self, user_id: &str, at: DateTime<Utc>) -> Result<Option<AttendanceRecord>, AppError> {
        let today = self.local_date(at);
        let recent = self
            .repo
            .list(&AttendanceFilter {
                user_id: Some(user_id.to_string()),
                from: today.pred_opt(),
                to: Some(today),
                ..Default::default()
            })
            .await?;

        // Newest first, so the first open IN wins
        Ok(recent
            .iter()
            .filter(|r| r.status == AttendanceStatus::In)
            .filter(|r| r.local_date == today || r.shift == ShiftType::Night)
            .find(|r| {
                !recent.iter().any(|o| {
                    o.status == AttendanceStatus::Out && o.shift == r.shift && o.local_date == r.local_date
                })
            })
            .cloned())
    }

    /// Stores an edited record, keeping one IN and at most one OUT per session.
    pub async fn amend(&self, before: &AttendanceRecord, record: &AttendanceRecord) -> Result<(), AppError> {
        let _guard = self.gate.lock().await;

        let moved = record.shift != before.shift || record.local_date != before.local_date;
        if moved {
            let target = self.repo.find_session(&record.user_id, record.shift, record.local_date).await?;
            if target.iter().any(|r| r.id != record.id && r.status == record.status) {
                return Err(AppError::Conflict(format!(
                    "Attendance record already exists for {} shift on {}",
                    record.shift, record.local_date
                )));
            }

            match record.status {
                // The session's OUT would be left without its IN
                AttendanceStatus::In => {
                    let source = self.repo.find_session(&record.user_id, before.shift, before.local_date).await?;
                    if source.iter().any(|r| r.status == AttendanceStatus::Out) {
                        return Err(AppError::Conflict(
                            "Session already clocked out; edit its OUT record first".to_string(),
                        ));
                    }
                }
                AttendanceStatus::Out => {
                    if !target.iter().any(|r| r.status == AttendanceStatus::In) {
                        return Err(AppError::Conflict("No clock-in for that session".to_string()));
                    }
                }
            }
        }

        if !self.repo.update(record).await? {
            return Err(AppError::NotFound("Attendance record not found".to_string()));
        }
        Ok(())
    }
}

fn is_open(session: &[AttendanceRecord]) -> bool {
    session.iter().any(|r| r.status == AttendanceStatus::In)
        && !session.iter().any(|r| r.status == AttendanceStatus::Out)
}

fn is_manager(claims: &Claims) -> bool {
    claims.has_role(&[Role::Admin, Role::Manager])
}

/// REST clock-in: fills hospital and shift from the profile and today's
/// roster, and checks the QR token when one is presented or required.
pub async fn clock_in(state: &AppState, user_id: &str, request: &ClockRequest) -> Result<AttendanceRecord, AppError> {
    let now = Utc::now();
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let hospital_id = request.hospital_id.clone().or(user.hospital_id);

    if state.config.qr.required || request.qr_token.is_some() {
        let hospital_id = hospital_id
            .as_deref()
            .ok_or_else(|| AppError::Validation("hospital_id is required for QR clock-in".to_string()))?;
        let token = request
            .qr_token
            .as_deref()
            .ok_or_else(|| AppError::Validation("QR code required".to_string()))?;
        qr_service::validate_token(token, hospital_id, state.config.qr.ttl_secs, now)?;
    }

    let shift = match (request.shift, hospital_id.as_deref()) {
        (Some(shift), _) => shift,
        (None, Some(hospital_id)) => {
            let today = state.recorder.local_date(now).to_string();
            assignment_service::resolve(state, user_id, hospital_id, &today)
                .await?
                .map(|a| a.shift)
                .ok_or_else(|| AppError::Validation("No shift assigned for today".to_string()))?
        }
        (None, None) => return Err(AppError::Validation("shift is required".to_string())),
    };

    state.recorder.clock_in(user_id, hospital_id.as_deref(), shift, now).await
}

pub async fn clock_out(state: &AppState, user_id: &str, request: &ClockRequest) -> Result<AttendanceRecord, AppError> {
    let now = Utc::now();
    let shift = match request.shift {
        Some(shift) => shift,
        None => state
            .recorder
            .open_session(user_id, now)
            .await?
            .map(|r| r.shift)
            .ok_or_else(|| AppError::NotFound("No active clock-in found".to_string()))?,
    };

    state.recorder.clock_out(user_id, request.hospital_id.as_deref(), shift, now).await
}

pub async fn status(state: &AppState, user_id: &str) -> Result<AttendanceStatusResponse, AppError> {
    let now = Utc::now();
    let today = state.recorder.local_date(now);

    let records = state
        .attendance
        .list(&AttendanceFilter {
            user_id: Some(user_id.to_string()),
            from: Some(today),
            to: Some(today),
            ..Default::default()
        })
        .await?;
    let open = state.recorder.open_session(user_id, now).await?;

    let assigned_shift = match state.users.find_by_id(user_id).await?.and_then(|u| u.hospital_id) {
        Some(hospital_id) => assignment_service::resolve(state, user_id, &hospital_id, &today.to_string())
            .await?
            .map(|a| a.shift),
        None => None,
    };

    let latest_in = open
        .clone()
        .or_else(|| records.iter().find(|r| r.status == AttendanceStatus::In).cloned());
    let latest_out = records.iter().find(|r| r.status == AttendanceStatus::Out);

    Ok(AttendanceStatusResponse {
        date: today,
        assigned_shift,
        is_clocked_in: open.is_some(),
        clock_in_time: latest_in.map(|r| r.timestamp),
        clock_out_time: if open.is_some() { None } else { latest_out.map(|r| r.timestamp) },
        duration_minutes: if open.is_some() { None } else { latest_out.and_then(|r| r.duration_minutes) },
        records,
    })
}

/// Personal history, newest first. Defaults to the last 30 days.
pub async fn history(
    state: &AppState,
    user_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<AttendanceRecord>, AppError> {
    let today = state.recorder.local_date(Utc::now());
    state
        .attendance
        .list(&AttendanceFilter {
            user_id: Some(user_id.to_string()),
            from: from.or_else(|| Some(today - Duration::days(30))),
            to,
            ..Default::default()
        })
        .await
}

/// Staff only ever see their own records.
pub async fn list_records(
    state: &AppState,
    claims: &Claims,
    mut filter: AttendanceFilter,
) -> Result<Vec<AttendanceRecord>, AppError> {
    if !is_manager(claims) {
        filter.user_id = Some(claims.sub.clone());
    }
    state.attendance.list(&filter).await
}

pub async fn update_record(
    state: &AppState,
    actor_id: &str,
    id: &str,
    request: &UpdateAttendanceRequest,
) -> Result<AttendanceRecord, AppError> {
    let before = state
        .attendance
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".to_string()))?;
    let mut record = before.clone();

    if let Some(shift) = request.shift {
        record.shift = shift;
    }
    if let Some(timestamp) = request.timestamp {
        record.timestamp = timestamp;
        // An OUT stays attached to the day its session started
        if record.status == AttendanceStatus::In {
            record.local_date = state.recorder.local_date(timestamp);
        }
    }
    if let Some(hospital_id) = &request.hospital_id {
        record.hospital_id = Some(hospital_id.clone());
    }
    if let Some(minutes) = request.duration_minutes {
        if minutes < 0 {
            return Err(AppError::Validation("duration_minutes must not be negative".to_string()));
        }
        if record.status != AttendanceStatus::Out {
            return Err(AppError::Validation("Only OUT records carry a duration".to_string()));
        }
        record.duration_minutes = Some(minutes);
    }

    state.recorder.amend(&before, &record).await?;
    audit_service::record(state, Some(actor_id), "update", "attendance", Some(id), Some(&before), Some(&record)).await;
    Ok(record)
}

/// QR token for a hospital's clock-in screen.
pub async fn issue_qr_token(
    state: &AppState,
    claims: &Claims,
    hospital_id: Option<String>,
) -> Result<qr_service::QrTokenResponse, AppError> {
    let hospital_id = match hospital_id {
        Some(id) => id,
        None => state
            .users
            .find_by_id(&claims.sub)
            .await?
            .and_then(|u| u.hospital_id)
            .ok_or_else(|| AppError::Validation("hospital_id is required".to_string()))?,
    };
    if state.hospitals.find_by_id(&hospital_id).await?.is_none() {
        return Err(AppError::NotFound("Hospital not found".to_string()));
    }

    let now = Utc::now();
    Ok(qr_service::QrTokenResponse {
        token: qr_service::generate_token(&claims.sub, &hospital_id, now)?,
        hospital_id,
        expires_at: now + Duration::seconds(state.config.qr.ttl_secs),
    })
}
