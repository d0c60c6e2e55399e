use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Collection;
use serde::{de::DeserializeOwned, Serialize};

use super::{
    AssignmentRepository, AttendanceRepository, AuditRepository, HospitalRepository,
    RosterRepository, ShiftRepository, UserRepository,
};
use crate::models::{
    AssignmentFilter, AttendanceFilter, AttendanceRecord, AttendanceStatus, AuditEvent, Hospital,
    Roster, ShiftAssignment, ShiftDefinition, ShiftType, User,
};
use crate::utils::AppError;

const DUPLICATE_KEY: i32 = 11000;

/// Collection-backed repository. Documents are keyed by their `id` field;
/// Mongo's own `_id` is left to the server and ignored on read.
pub struct MongoRepository<T: Send + Sync> {
    collection: Collection<T>,
}

impl<T> MongoRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    pub fn new(collection: Collection<T>) -> Self {
        Self { collection }
    }

    async fn insert_one(&self, item: T, conflict_msg: &str) -> Result<T, AppError> {
        match self.collection.insert_one(&item).await {
            Ok(_) => Ok(item),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(conflict_msg.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>, AppError> {
        Ok(self.collection.find_one(filter).await?)
    }

    async fn find_many(&self, filter: Document) -> Result<Vec<T>, AppError> {
        let cursor = self.collection.find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_by_id(&self, id: &str, item: &T) -> Result<bool, AppError> {
        match self.collection.replace_one(doc! { "id": id }, item).await {
            Ok(result) => Ok(result.matched_count > 0),
            // A unique index would be broken by the new key fields
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict("Record already exists".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, AppError> {
        let result = self.collection.delete_one(doc! { "id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

pub fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        ErrorKind::InsertMany(ime) => ime
            .write_errors
            .as_ref()
            .map_or(false, |errs| errs.iter().any(|we| we.code == DUPLICATE_KEY)),
        _ => false,
    }
}

fn hospital_filter(hospital_id: Option<&str>) -> Document {
    match hospital_id {
        Some(h) => doc! { "hospital_id": h },
        None => doc! {},
    }
}

/// Dates are stored as `YYYY-MM-DD` strings, so range filters compare lexically.
fn date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<Document> {
    let mut range = Document::new();
    if let Some(from) = from {
        range.insert("$gte", from.to_string());
    }
    if let Some(to) = to {
        range.insert("$lte", to.to_string());
    }
    (!range.is_empty()).then_some(range)
}

fn assignment_query(filter: &AssignmentFilter) -> Document {
    let mut query = Document::new();
    if let Some(user_id) = &filter.user_id {
        query.insert("user_id", user_id);
    }
    if let Some(hospital_id) = &filter.hospital_id {
        query.insert("hospital_id", hospital_id);
    }
    if let Some(roster_id) = &filter.roster_id {
        query.insert("roster_id", roster_id);
    }
    if let Some(range) = date_range(filter.from, filter.to) {
        query.insert("date", range);
    }
    query
}

fn attendance_query(filter: &AttendanceFilter) -> Document {
    let mut query = Document::new();
    if let Some(user_id) = &filter.user_id {
        query.insert("user_id", user_id);
    }
    if let Some(hospital_id) = &filter.hospital_id {
        query.insert("hospital_id", hospital_id);
    }
    if let Some(status) = filter.status {
        let status = match status {
            AttendanceStatus::In => "IN",
            AttendanceStatus::Out => "OUT",
        };
        query.insert("status", status);
    }
    if let Some(range) = date_range(filter.from, filter.to) {
        query.insert("local_date", range);
    }
    query
}

#[async_trait]
impl UserRepository for MongoRepository<User> {
    async fn insert(&self, user: User) -> Result<User, AppError> {
        self.insert_one(user, "User already exists").await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        self.find_one(doc! { "id": id }).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one(doc! { "email": email.to_lowercase() }).await
    }

    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<User>, AppError> {
        self.find_many(hospital_filter(hospital_id)).await
    }

    async fn update(&self, user: &User) -> Result<bool, AppError> {
        match self.collection.replace_one(doc! { "id": &user.id }, user).await {
            Ok(result) => Ok(result.matched_count > 0),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict("Email already in use".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.delete_by_id(id).await
    }
}

#[async_trait]
impl HospitalRepository for MongoRepository<Hospital> {
    async fn insert(&self, hospital: Hospital) -> Result<Hospital, AppError> {
        self.insert_one(hospital, "Hospital already exists").await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Hospital>, AppError> {
        self.find_one(doc! { "id": id }).await
    }

    async fn list(&self) -> Result<Vec<Hospital>, AppError> {
        self.find_many(doc! {}).await
    }

    async fn update(&self, hospital: &Hospital) -> Result<bool, AppError> {
        self.replace_by_id(&hospital.id, hospital).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.delete_by_id(id).await
    }
}

#[async_trait]
impl ShiftRepository for MongoRepository<ShiftDefinition> {
    async fn insert(&self, shift: ShiftDefinition) -> Result<ShiftDefinition, AppError> {
        self.insert_one(shift, "Shift already exists").await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftDefinition>, AppError> {
        self.find_one(doc! { "id": id }).await
    }

    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<ShiftDefinition>, AppError> {
        self.find_many(hospital_filter(hospital_id)).await
    }

    async fn update(&self, shift: &ShiftDefinition) -> Result<bool, AppError> {
        self.replace_by_id(&shift.id, shift).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.delete_by_id(id).await
    }
}

#[async_trait]
impl RosterRepository for MongoRepository<Roster> {
    async fn insert(&self, roster: Roster) -> Result<Roster, AppError> {
        self.insert_one(roster, "Roster already exists").await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Roster>, AppError> {
        self.find_one(doc! { "id": id }).await
    }

    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<Roster>, AppError> {
        self.find_many(hospital_filter(hospital_id)).await
    }

    async fn update(&self, roster: &Roster) -> Result<bool, AppError> {
        self.replace_by_id(&roster.id, roster).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.delete_by_id(id).await
    }
}

#[async_trait]
impl AssignmentRepository for MongoRepository<ShiftAssignment> {
    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<ShiftAssignment>, AppError> {
        let mut rows = self.find_many(assignment_query(filter)).await?;
        rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftAssignment>, AppError> {
        self.find_one(doc! { "id": id }).await
    }

    async fn find_for(
        &self,
        user_id: &str,
        hospital_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, AppError> {
        self.find_many(doc! {
            "user_id": user_id,
            "hospital_id": hospital_id,
            "date": date.to_string(),
        })
        .await
    }

    async fn insert(&self, assignment: ShiftAssignment) -> Result<ShiftAssignment, AppError> {
        self.insert_one(assignment, "Assignment already exists for this user and date").await
    }

    async fn insert_many(&self, assignments: Vec<ShiftAssignment>) -> Result<usize, AppError> {
        if assignments.is_empty() {
            return Ok(0);
        }
        match self.collection.insert_many(&assignments).await {
            Ok(result) => Ok(result.inserted_ids.len()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(
                "Assignments already exist for this month".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, assignment: &ShiftAssignment) -> Result<bool, AppError> {
        self.replace_by_id(&assignment.id, assignment).await
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.delete_by_id(id).await
    }
}

#[async_trait]
impl AttendanceRepository for MongoRepository<AttendanceRecord> {
    async fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, AppError> {
        let msg = match record.status {
            AttendanceStatus::In => "Already clocked in",
            AttendanceStatus::Out => "Already clocked out",
        };
        self.insert_one(record, msg).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, AppError> {
        self.find_one(doc! { "id": id }).await
    }

    async fn list(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut records = self.find_many(attendance_query(filter)).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn find_session(
        &self,
        user_id: &str,
        shift: ShiftType,
        local_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        self.find_many(doc! {
            "user_id": user_id,
            "shift": shift.as_str(),
            "local_date": local_date.to_string(),
        })
        .await
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<bool, AppError> {
        self.replace_by_id(&record.id, record).await
    }
}

#[async_trait]
impl AuditRepository for MongoRepository<AuditEvent> {
    async fn insert(&self, event: AuditEvent) -> Result<AuditEvent, AppError> {
        self.insert_one(event, "Audit event already exists").await
    }

    async fn list(&self, limit: usize) -> Result<Vec<AuditEvent>, AppError> {
        let mut events = self.find_many(doc! {}).await?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assignment_query_builds_date_range() {
        let filter = AssignmentFilter {
            hospital_id: Some("hosp-101".into()),
            from: NaiveDate::from_ymd_opt(2025, 11, 1),
            to: NaiveDate::from_ymd_opt(2025, 11, 30),
            ..Default::default()
        };
        let query = assignment_query(&filter);
        assert_eq!(query.get_str("hospital_id").unwrap(), "hosp-101");
        let range = query.get_document("date").unwrap();
        assert_eq!(range.get_str("$gte").unwrap(), "2025-11-01");
        assert_eq!(range.get_str("$lte").unwrap(), "2025-11-30");
        assert!(!query.contains_key("user_id"));
    }

    #[test]
    fn test_attendance_query_uses_wire_status() {
        let filter = AttendanceFilter {
            user_id: Some("4".into()),
            status: Some(AttendanceStatus::Out),
            ..Default::default()
        };
        let query = attendance_query(&filter);
        assert_eq!(query.get_str("status").unwrap(), "OUT");
        assert!(!query.contains_key("local_date"));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongo_assignment_roundtrip() {
        dotenv::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/shift_attendance_test".to_string());
        let db = crate::database::MongoDB::new(&url).await.unwrap();
        let repo = MongoRepository::<ShiftAssignment>::new(db.collection("shift_assignments"));

        let date = NaiveDate::from_ymd_opt(2031, 1, 15).unwrap();
        let row = ShiftAssignment::new("it-user", "it-hosp", date, ShiftType::Morning);
        let id = row.id.clone();
        AssignmentRepository::insert(&repo, row).await.unwrap();

        let found = repo.find_for("it-user", "it-hosp", date).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(AssignmentRepository::delete(&repo, &id).await.unwrap());
    }
}
