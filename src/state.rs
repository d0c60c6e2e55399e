use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::MongoDB;
use crate::models::{
    AttendanceRecord, AuditEvent, Hospital, Roster, ShiftAssignment, ShiftDefinition, User,
};
use crate::repositories::{
    AssignmentRepository, AttendanceRepository, AuditRepository, HospitalRepository,
    MemoryRepository, MongoRepository, RosterRepository, SheetsAssignmentStore, ShiftRepository,
    UserRepository,
};
use crate::services::attendance_service::AttendanceRecorder;

/// Shared application state handed to every handler through `web::Data`.
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserRepository>,
    pub hospitals: Arc<dyn HospitalRepository>,
    pub shifts: Arc<dyn ShiftRepository>,
    pub rosters: Arc<dyn RosterRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub attendance: Arc<dyn AttendanceRepository>,
    pub audit: Arc<dyn AuditRepository>,
    pub recorder: AttendanceRecorder,
    db: Option<MongoDB>,
}

impl AppState {
    /// Mock mode: every collection lives in process memory.
    pub fn in_memory(config: AppConfig) -> Self {
        let assignments: Arc<dyn AssignmentRepository> =
            Arc::new(MemoryRepository::<ShiftAssignment>::new());
        let attendance: Arc<dyn AttendanceRepository> =
            Arc::new(MemoryRepository::<AttendanceRecord>::new());

        Self::assemble(
            config,
            Arc::new(MemoryRepository::<User>::new()),
            Arc::new(MemoryRepository::<Hospital>::new()),
            Arc::new(MemoryRepository::<ShiftDefinition>::new()),
            Arc::new(MemoryRepository::<Roster>::new()),
            assignments,
            attendance,
            Arc::new(MemoryRepository::<AuditEvent>::new()),
            None,
        )
    }

    pub fn with_mongodb(config: AppConfig, db: MongoDB) -> Self {
        Self::assemble(
            config,
            Arc::new(MongoRepository::<User>::new(db.collection("users"))),
            Arc::new(MongoRepository::<Hospital>::new(db.collection("hospitals"))),
            Arc::new(MongoRepository::<ShiftDefinition>::new(db.collection("shifts"))),
            Arc::new(MongoRepository::<Roster>::new(db.collection("rosters"))),
            Arc::new(MongoRepository::<ShiftAssignment>::new(db.collection("shift_assignments"))),
            Arc::new(MongoRepository::<AttendanceRecord>::new(db.collection("attendance"))),
            Arc::new(MongoRepository::<AuditEvent>::new(db.collection("audit_events"))),
            Some(db),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        hospitals: Arc<dyn HospitalRepository>,
        shifts: Arc<dyn ShiftRepository>,
        rosters: Arc<dyn RosterRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        attendance: Arc<dyn AttendanceRepository>,
        audit: Arc<dyn AuditRepository>,
        db: Option<MongoDB>,
    ) -> Self {
        // The roster sheet replaces only the assignment store
        let assignments: Arc<dyn AssignmentRepository> = match &config.sheets {
            Some(sheets) => {
                log::info!("📄 Shift assignments stored in roster sheet {}", sheets.api_url);
                Arc::new(SheetsAssignmentStore::new(sheets.clone(), config.local_offset))
            }
            None => assignments,
        };
        let recorder = AttendanceRecorder::new(attendance.clone(), config.local_offset);

        Self {
            config,
            users,
            hospitals,
            shifts,
            rosters,
            assignments,
            attendance,
            audit,
            recorder,
            db,
        }
    }

    /// Backend reachability for the health endpoint.
    pub async fn storage_healthy(&self) -> bool {
        match &self.db {
            Some(db) => db.ping().await,
            None => true,
        }
    }
}
