use async_trait::async_trait;
use live_state::{LiveCell, Snapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::contract::model::{
    AuditLogEntry, ChatMessageRecord, CourseRecord, EnrollmentRecord, RecordId, UserRecord,
};
use crate::domain::repo::{CollectionStore, LiveQuery, PortalStore, Record, StoreError};

/// One insertion-ordered collection kept in memory.
///
/// Writers are serialized by `write_gate`, and each writer publishes its
/// snapshot before releasing it, so subscribers never see an older snapshot
/// after a newer one.
///
/// Snapshots are delivered while `write_gate` is held. A live-query listener
/// must not write to a collection or subscribe to a view from inside its
/// callback; spawn a task for follow-up work.
pub struct MemoryCollection<R> {
    records: LiveCell<Snapshot<R>>,
    write_gate: Mutex<()>,
}

impl<R: Record> Default for MemoryCollection<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> MemoryCollection<R> {
    pub fn new() -> Self {
        Self {
            records: LiveCell::with_value(Arc::new(Vec::new())),
            write_gate: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Snapshot<R> {
        self.records.get().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live listeners currently attached to this collection.
    pub fn subscriber_count(&self) -> usize {
        self.records.listener_count()
    }

    fn insert_now(&self, mut record: R) -> Result<RecordId, StoreError> {
        let _write = self.write_gate.lock();
        let current = self.snapshot();

        if record.id().is_unassigned() {
            record.assign_id(RecordId::generate());
        } else if current.iter().any(|r| r.id() == record.id()) {
            return Err(StoreError::Duplicate {
                collection: R::COLLECTION,
                id: record.id().clone(),
            });
        }

        let id = record.id().clone();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(record);
        self.records.set(Arc::new(next));

        debug!(collection = %R::COLLECTION, %id, "record inserted");
        Ok(id)
    }

    fn update_now(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError> {
        let _write = self.write_gate.lock();
        let mut next: Vec<R> = self.snapshot().iter().cloned().collect();

        let Some(record) = next.iter_mut().find(|r| r.id() == id) else {
            return Err(StoreError::NotFound {
                collection: R::COLLECTION,
                id: id.clone(),
            });
        };
        record.apply(patch);
        let updated = record.clone();
        self.records.set(Arc::new(next));

        debug!(collection = %R::COLLECTION, %id, "record updated");
        Ok(updated)
    }
}

#[async_trait]
impl<R: Record> CollectionStore<R> for MemoryCollection<R> {
    fn query_all(&self) -> LiveQuery<R> {
        Arc::new(self.records.clone())
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<R>, StoreError> {
        Ok(self.snapshot().iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, record: R) -> Result<RecordId, StoreError> {
        self.insert_now(record)
    }

    async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError> {
        self.update_now(id, patch)
    }
}

/// Reference store keeping every collection in process memory.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub users: Arc<MemoryCollection<UserRecord>>,
    pub courses: Arc<MemoryCollection<CourseRecord>>,
    pub enrollments: Arc<MemoryCollection<EnrollmentRecord>>,
    pub chat_messages: Arc<MemoryCollection<ChatMessageRecord>>,
    pub audit_logs: Arc<MemoryCollection<AuditLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn portal_store(&self) -> PortalStore {
        PortalStore {
            users: self.users.clone(),
            courses: self.courses.clone(),
            enrollments: self.enrollments.clone(),
            chat_messages: self.chat_messages.clone(),
            audit_logs: self.audit_logs.clone(),
        }
    }

    /// Live listeners across all collections.
    pub fn subscriber_count(&self) -> usize {
        self.users.subscriber_count()
            + self.courses.subscriber_count()
            + self.enrollments.subscriber_count()
            + self.chat_messages.subscriber_count()
            + self.audit_logs.subscriber_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{EnrollmentPatch, EnrollmentStatus, Role};
    use chrono::Utc;
    use live_state::{Delivery, LiveSource};

    fn user(id: &str, role: Role) -> UserRecord {
        UserRecord {
            id: RecordId::parse(id).unwrap(),
            display_name: id.to_uppercase(),
            role,
            email: format!("{id}@uni.test"),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_rejects_duplicates() {
        let users = MemoryCollection::<UserRecord>::new();

        let mut anonymous = user("x", Role::Student);
        anonymous.id = RecordId::UNASSIGNED;
        let assigned = users.insert(anonymous).await.unwrap();
        assert!(!assigned.is_unassigned());
        assert_eq!(assigned.as_str().len(), 32);

        users.insert(user("alice", Role::Student)).await.unwrap();
        let err = users
            .insert(user("alice", Role::Tutor))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn update_returns_patched_record_or_not_found() {
        let enrollments = MemoryCollection::<EnrollmentRecord>::new();
        let id = enrollments
            .insert(EnrollmentRecord {
                id: RecordId::UNASSIGNED,
                student_id: RecordId::parse("s1").unwrap(),
                course_id: RecordId::parse("c1").unwrap(),
                status: EnrollmentStatus::PendingReview,
                applied_at: Utc::now(),
            })
            .await
            .unwrap();

        let patch = EnrollmentPatch {
            status: EnrollmentStatus::Approved,
        };
        let updated = enrollments.update(&id, patch).await.unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Approved);
        assert_eq!(
            enrollments.find_by_id(&id).await.unwrap().unwrap().status,
            EnrollmentStatus::Approved
        );

        let missing = RecordId::parse("missing").unwrap();
        let err = enrollments.update(&missing, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn query_delivers_current_snapshot_then_every_mutation() {
        let users = MemoryCollection::<UserRecord>::new();
        users.insert(user("a", Role::Student)).await.unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = users.query_all().observe(Arc::new(move |d: &Delivery<Snapshot<UserRecord>>| {
            sink.lock().push(d.as_ref().map(|s| s.len()).unwrap_or(usize::MAX));
        }));
        assert_eq!(users.subscriber_count(), 1);

        users.insert(user("b", Role::Student)).await.unwrap();
        users.insert(user("c", Role::Tutor)).await.unwrap();
        assert_eq!(*seen.lock(), vec![1, 2, 3]);

        drop(_sub);
        assert_eq!(users.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn failed_mutations_publish_nothing() {
        let users = MemoryCollection::<UserRecord>::new();
        users.insert(user("a", Role::Student)).await.unwrap();

        let deliveries = Arc::new(Mutex::new(0usize));
        let counter = deliveries.clone();
        let _sub = users.query_all().observe(Arc::new(move |_: &Delivery<Snapshot<UserRecord>>| {
            *counter.lock() += 1;
        }));

        let _ = users.insert(user("a", Role::Student)).await;
        let _ = users
            .update(&RecordId::parse("zzz").unwrap(), Default::default())
            .await;
        assert_eq!(*deliveries.lock(), 1);
    }
}
