use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{
    AssignmentRepository, AttendanceRepository, AuditRepository, HospitalRepository, Identified,
    RosterRepository, ShiftRepository, UserRepository,
};
use crate::models::{
    AssignmentFilter, AttendanceFilter, AttendanceRecord, AuditEvent, Hospital, Roster,
    ShiftAssignment, ShiftDefinition, ShiftType, User,
};
use crate::utils::AppError;

/// Vec-backed collection used in mock mode and tests.
pub struct MemoryRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T: Identified + Clone + Send + Sync> MemoryRepository<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self { items: RwLock::new(items) }
    }

    async fn add(&self, item: T) -> Result<T, AppError> {
        let mut items = self.items.write().await;
        if items.iter().any(|existing| existing.id() == item.id()) {
            return Err(AppError::Conflict(format!("Duplicate id {}", item.id())));
        }
        items.push(item.clone());
        Ok(item)
    }

    async fn get(&self, id: &str) -> Option<T> {
        self.items.read().await.iter().find(|item| item.id() == id).cloned()
    }

    async fn filter<F>(&self, pred: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.read().await.iter().filter(|item| pred(item)).cloned().collect()
    }

    async fn replace(&self, item: &T) -> bool {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item.clone();
                true
            }
            None => false,
        }
    }

    async fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id() != id);
        items.len() != before
    }
}

impl<T: Identified + Clone + Send + Sync> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository<User> {
    async fn insert(&self, user: User) -> Result<User, AppError> {
        let mut items = self.items.write().await;
        if items.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        if items.iter().any(|u| u.id == user.id) {
            return Err(AppError::Conflict(format!("Duplicate id {}", user.id)));
        }
        items.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.get(id).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<User>, AppError> {
        Ok(self
            .filter(|u| hospital_id.map_or(true, |h| u.hospital_id.as_deref() == Some(h)))
            .await)
    }

    async fn update(&self, user: &User) -> Result<bool, AppError> {
        Ok(self.replace(user).await)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.remove(id).await)
    }
}

#[async_trait]
impl HospitalRepository for MemoryRepository<Hospital> {
    async fn insert(&self, hospital: Hospital) -> Result<Hospital, AppError> {
        self.add(hospital).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Hospital>, AppError> {
        Ok(self.get(id).await)
    }

    async fn list(&self) -> Result<Vec<Hospital>, AppError> {
        Ok(self.filter(|_| true).await)
    }

    async fn update(&self, hospital: &Hospital) -> Result<bool, AppError> {
        Ok(self.replace(hospital).await)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.remove(id).await)
    }
}

#[async_trait]
impl ShiftRepository for MemoryRepository<ShiftDefinition> {
    async fn insert(&self, shift: ShiftDefinition) -> Result<ShiftDefinition, AppError> {
        self.add(shift).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftDefinition>, AppError> {
        Ok(self.get(id).await)
    }

    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<ShiftDefinition>, AppError> {
        Ok(self.filter(|s| hospital_id.map_or(true, |h| s.hospital_id == h)).await)
    }

    async fn update(&self, shift: &ShiftDefinition) -> Result<bool, AppError> {
        Ok(self.replace(shift).await)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.remove(id).await)
    }
}

#[async_trait]
impl RosterRepository for MemoryRepository<Roster> {
    async fn insert(&self, roster: Roster) -> Result<Roster, AppError> {
        self.add(roster).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Roster>, AppError> {
        Ok(self.get(id).await)
    }

    async fn list(&self, hospital_id: Option<&str>) -> Result<Vec<Roster>, AppError> {
        Ok(self.filter(|r| hospital_id.map_or(true, |h| r.hospital_id == h)).await)
    }

    async fn update(&self, roster: &Roster) -> Result<bool, AppError> {
        Ok(self.replace(roster).await)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.remove(id).await)
    }
}

#[async_trait]
impl AssignmentRepository for MemoryRepository<ShiftAssignment> {
    async fn list(&self, filter: &AssignmentFilter) -> Result<Vec<ShiftAssignment>, AppError> {
        Ok(self.filter(|a| filter.accepts(a)).await)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ShiftAssignment>, AppError> {
        Ok(self.get(id).await)
    }

    async fn find_for(
        &self,
        user_id: &str,
        hospital_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ShiftAssignment>, AppError> {
        Ok(self.filter(|a| a.matches(user_id, hospital_id, date)).await)
    }

    async fn insert(&self, assignment: ShiftAssignment) -> Result<ShiftAssignment, AppError> {
        self.insert_many(vec![assignment.clone()]).await?;
        Ok(assignment)
    }

    /// All-or-nothing: one clashing (user, hospital, date) key rejects the batch.
    async fn insert_many(&self, assignments: Vec<ShiftAssignment>) -> Result<usize, AppError> {
        let mut items = self.items.write().await;
        for (i, a) in assignments.iter().enumerate() {
            let clash = items.iter().chain(&assignments[..i]).any(|existing| {
                existing.id == a.id || existing.matches(&a.user_id, &a.hospital_id, a.date)
            });
            if clash {
                return Err(AppError::Conflict(format!(
                    "Assignment already exists for user {} on {}",
                    a.user_id, a.date
                )));
            }
        }
        let count = assignments.len();
        items.extend(assignments);
        Ok(count)
    }

    async fn update(&self, assignment: &ShiftAssignment) -> Result<bool, AppError> {
        Ok(self.replace(assignment).await)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        Ok(self.remove(id).await)
    }
}

#[async_trait]
impl AttendanceRepository for MemoryRepository<AttendanceRecord> {
    async fn insert(&self, record: AttendanceRecord) -> Result<AttendanceRecord, AppError> {
        self.add(record).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<AttendanceRecord>, AppError> {
        Ok(self.get(id).await)
    }

    async fn list(&self, filter: &AttendanceFilter) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut records = self.filter(|r| filter.accepts(r)).await;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    async fn find_session(
        &self,
        user_id: &str,
        shift: ShiftType,
        local_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        Ok(self
            .filter(|r| r.user_id == user_id && r.shift == shift && r.local_date == local_date)
            .await)
    }

    async fn update(&self, record: &AttendanceRecord) -> Result<bool, AppError> {
        Ok(self.replace(record).await)
    }
}

#[async_trait]
impl AuditRepository for MemoryRepository<AuditEvent> {
    async fn insert(&self, event: AuditEvent) -> Result<AuditEvent, AppError> {
        self.add(event).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<AuditEvent>, AppError> {
        let items = self.items.read().await;
        Ok(items.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn hospital(id: &str) -> Hospital {
        Hospital {
            id: id.to_string(),
            name: format!("Hospital {}", id),
            address: None,
            contact: None,
            email: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let repo = MemoryRepository::<Hospital>::new();
        HospitalRepository::insert(&repo, hospital("hosp-101")).await.unwrap();
        let err = HospitalRepository::insert(&repo, hospital("hosp-101")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_report_missing_rows() {
        let repo = MemoryRepository::<Hospital>::new();
        assert!(!HospitalRepository::update(&repo, &hospital("nope")).await.unwrap());
        assert!(!HospitalRepository::delete(&repo, "nope").await.unwrap());

        HospitalRepository::insert(&repo, hospital("hosp-102")).await.unwrap();
        let mut h = hospital("hosp-102");
        h.name = "Green Valley Hospital".into();
        assert!(HospitalRepository::update(&repo, &h).await.unwrap());
        let stored = HospitalRepository::find_by_id(&repo, "hosp-102").await.unwrap().unwrap();
        assert_eq!(stored.name, "Green Valley Hospital");
        assert!(HospitalRepository::delete(&repo, "hosp-102").await.unwrap());
    }

    #[tokio::test]
    async fn test_month_listing_is_bounded() {
        let repo = MemoryRepository::<ShiftAssignment>::new();
        let d = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
        repo.insert_many(vec![
            ShiftAssignment::new("1", "hosp-101", d(10, 31), ShiftType::Night),
            ShiftAssignment::new("1", "hosp-101", d(11, 1), ShiftType::Night),
            ShiftAssignment::new("1", "hosp-101", d(11, 30), ShiftType::Morning),
            ShiftAssignment::new("1", "hosp-102", d(11, 2), ShiftType::Morning),
            ShiftAssignment::new("1", "hosp-101", d(12, 1), ShiftType::Night),
        ])
        .await
        .unwrap();

        let november = repo.list_month("hosp-101", 2025, 11).await.unwrap();
        assert_eq!(november.len(), 2);
        assert!(repo.list_month("hosp-101", 2025, 13).await.is_err());
    }

    #[tokio::test]
    async fn test_assignment_key_is_unique() {
        let repo = MemoryRepository::<ShiftAssignment>::new();
        let date = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        AssignmentRepository::insert(&repo, ShiftAssignment::new("4", "hosp-101", date, ShiftType::Morning))
            .await
            .unwrap();

        let err = AssignmentRepository::insert(&repo, ShiftAssignment::new("4", "hosp-101", date, ShiftType::Night))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // A clash anywhere in the batch leaves the store untouched
        let next = date.succ_opt().unwrap();
        let err = repo
            .insert_many(vec![
                ShiftAssignment::new("5", "hosp-101", next, ShiftType::Morning),
                ShiftAssignment::new("5", "hosp-101", next, ShiftType::Night),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.list(&AssignmentFilter::default()).await.unwrap().len(), 1);
    }
}
