use async_trait::async_trait;
use live_state::{SharedSource, Snapshot};
use std::convert::Infallible;
use std::sync::Arc;
use thiserror::Error;

use crate::contract::model::{
    AuditLogEntry, ChatMessageRecord, Collection, CoursePatch, CourseRecord, EnrollmentPatch,
    EnrollmentRecord, RecordId, UserPatch, UserRecord,
};

/// A record type the store can persist.
pub trait Record: Clone + PartialEq + Send + Sync + 'static {
    /// Partial update accepted by `update`; `Infallible` for append-only records.
    type Patch: Send + 'static;

    const COLLECTION: Collection;

    fn id(&self) -> &RecordId;
    fn assign_id(&mut self, id: RecordId);
    fn apply(&mut self, patch: Self::Patch);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{collection} record not found: {id}")]
    NotFound { collection: Collection, id: RecordId },

    #[error("{collection} record already exists: {id}")]
    Duplicate { collection: Collection, id: RecordId },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Live, insertion-ordered snapshot of a whole collection.
pub type LiveQuery<R> = SharedSource<Snapshot<R>>;

/// Port for the domain layer: one collection of the persistent store.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait CollectionStore<R: Record>: Send + Sync {
    /// Subscribing delivers the current snapshot right away, then the full
    /// snapshot again after every successful mutation.
    fn query_all(&self) -> LiveQuery<R>;
    async fn find_by_id(&self, id: &RecordId) -> Result<Option<R>, StoreError>;
    /// Records carrying `RecordId::UNASSIGNED` get a fresh id.
    async fn insert(&self, record: R) -> Result<RecordId, StoreError>;
    async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError>;
}

/// Handles to every collection the portal uses.
#[derive(Clone)]
pub struct PortalStore {
    pub users: Arc<dyn CollectionStore<UserRecord>>,
    pub courses: Arc<dyn CollectionStore<CourseRecord>>,
    pub enrollments: Arc<dyn CollectionStore<EnrollmentRecord>>,
    pub chat_messages: Arc<dyn CollectionStore<ChatMessageRecord>>,
    pub audit_logs: Arc<dyn CollectionStore<AuditLogEntry>>,
}

impl Record for UserRecord {
    type Patch = UserPatch;
    const COLLECTION: Collection = Collection::Users;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(display_name) = patch.display_name {
            self.display_name = display_name;
        }
        if let Some(photo_url) = patch.photo_url {
            self.photo_url = Some(photo_url);
        }
    }
}

impl Record for CourseRecord {
    type Patch = CoursePatch;
    const COLLECTION: Collection = Collection::Courses;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: CoursePatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(department) = patch.department {
            self.department = department;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

impl Record for EnrollmentRecord {
    type Patch = EnrollmentPatch;
    const COLLECTION: Collection = Collection::Enrollments;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: EnrollmentPatch) {
        self.status = patch.status;
    }
}

impl Record for ChatMessageRecord {
    type Patch = Infallible;
    const COLLECTION: Collection = Collection::ChatMessages;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}

impl Record for AuditLogEntry {
    type Patch = Infallible;
    const COLLECTION: Collection = Collection::AuditLogs;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn assign_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn apply(&mut self, patch: Infallible) {
        match patch {}
    }
}
