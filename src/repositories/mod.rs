//! Storage seams. Every entity is reached through a trait object held by
//! `AppState`, so handlers never know which backend is active.

pub mod memory;
pub mod mongo;
pub mod sheets;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{
    AssignmentFilter, AttendanceFilter, AttendanceRecord, AuditEvent, Hospital, Roster,
    ShiftAssignment, ShiftDefinition, ShiftType, User,
};
use crate::utils::AppError;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;
pub use sheets::SheetsAssignmentStore;

/// Entities addressed by a string identifier.
pub trait Identified {
    fn id(&self) -> &str;
}

macro_rules! identified {
    ($($ty:ty),*) => {
        $(impl Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

identified!(User, Hospital, ShiftDefinition, Roster, ShiftAssignment, AttendanceRecord, AuditEvent);

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<User>, AppError>;
    /// Replaces the stored user with the same id; false when it does not exist.
    async fn update(&self, user: &User) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait HospitalRepository: Send + Sync {
    async fn insert(&self, hospital: Hospital) -> Result<Hospital, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Hospital>, AppError>;
    async fn list(&self) -> Result<Vec<Hospital>, AppError>;
    async fn update(&self, hospital: &Hospital) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait ShiftRepository: Send + Sync {
    async fn insert(&self, shift: ShiftDefinition) -> Result<ShiftDefinition, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftDefinition>, AppError>;
    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<ShiftDefinition>, AppError>;
    async fn update(&self, shift: &ShiftDefinition) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

#[async_trait]
pub trait RosterRepository: Send + Sync {
    async fn insert(&self, roster: Roster) -> Result<Roster, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Roster>, AppError>;
    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<Roster>, AppError>;
    async fn update(&self, roster: &Roster) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

/// The assignment store: (user, hospital, date, shift) tuples.
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<ShiftAssignment>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftAssignment>, AppError>;
    /// Every row for the key; more than one means the store holds duplicates.
    async fn find_for(
        &self,
        user_id: &str,
        hospital_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, AppError>;
    async fn insert(&self, assignment: ShiftAssignment) -> Result<ShiftAssignment, AppError>;
    async fn insert_many(&self, assignments: Vec<ShiftAssignment>) -> Result<usize, AppError>;
    async fn update(&self, assignment: &ShiftAssignment) -> Result<bool, AppError>;
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn list_month(
        &self,
        hospital_id: &str,
        year: i32,
        month: u32,
    ) -> Result<Vec<ShiftAssignment>, AppError> {
        let (from, to) = crate::utils::dates::month_bounds(year, month)
            .ok_or_else(|| AppError::Validation(format!("Invalid month: {}-{}", year, month)))?;
        let filter = AssignmentFilter {
            hospital_id: Some(hospital_id.to_string()),
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };
        self.list(&filter).await
    }
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, AppError>;
    /// Sorted by timestamp, newest first.
    async fn list(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, AppError>;
    /// Records for one user/shift session day.
    async fn find_session(
        &self,
        user_id: &str,
        shift: ShiftType,
        local_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;
    async fn update(&self, record: &AttendanceRecord) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, event: AuditEvent) -> Result<AuditEvent, AppError>;
    /// Newest first.
    async fn list(&self, limit: usize) -> Result<Vec<AuditEvent>, AppError>;
}
