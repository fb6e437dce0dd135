#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use portal_core::contract::model::{
    Actor, AuditLogEntry, CourseRecord, EnrollmentRecord, EnrollmentStatus, RecordId, Role,
    UserRecord,
};
use portal_core::domain::error::DomainError;
use portal_core::domain::events::PortalDomainEvent;
use portal_core::domain::ports::{AuditDraft, AuditPort, Clock, EventPublisher};
use portal_core::domain::repo::{CollectionStore, LiveQuery, PortalStore, Record, StoreError};
use portal_core::domain::service::{ActionDispatcher, DispatcherConfig};
use portal_core::infra::audit::store_audit_logger::StoreAuditLogger;
use portal_core::infra::identity::static_identity::StaticIdentity;
use portal_core::infra::storage::memory_store::{InMemoryStore, MemoryCollection};

pub fn id(raw: &str) -> RecordId {
    RecordId::parse(raw).unwrap()
}

pub fn user(raw_id: &str, name: &str, role: Role) -> UserRecord {
    UserRecord {
        id: id(raw_id),
        display_name: name.to_string(),
        role,
        email: format!("{raw_id}@uni.test"),
        photo_url: None,
    }
}

pub fn course(raw_id: &str, title: &str, tutor: &str) -> CourseRecord {
    CourseRecord {
        id: id(raw_id),
        title: title.to_string(),
        department: "Mathematics".to_string(),
        tutor_id: id(tutor),
        content: String::new(),
        updated_at: epoch(),
    }
}

pub fn enrollment(raw_id: &str, student: &str, course: &str, status: EnrollmentStatus) -> EnrollmentRecord {
    EnrollmentRecord {
        id: id(raw_id),
        student_id: id(student),
        course_id: id(course),
        status,
        applied_at: epoch(),
    }
}

pub fn tutor() -> Actor {
    Actor {
        id: id("tutor-1"),
        display_name: "Dr. Ada".to_string(),
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

/// Deterministic clock: every reading is 10ms after the previous one.
pub struct StepClock {
    next: Mutex<DateTime<Utc>>,
}

impl StepClock {
    pub fn new() -> Self {
        Self {
            next: Mutex::new(epoch()),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock();
        let now = *next;
        *next = now + ChronoDuration::milliseconds(10);
        now
    }
}

/// Clock frozen at one instant, for tie-break tests.
pub struct FrozenClock;

impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Utc> {
        epoch()
    }
}

/// Store collection wrapper that counts write attempts and can simulate an outage.
pub struct Probe<R> {
    inner: Arc<MemoryCollection<R>>,
    writes: AtomicUsize,
    down: AtomicBool,
}

impl<R: Record> Probe<R> {
    pub fn new(inner: Arc<MemoryCollection<R>>) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            down: AtomicBool::new(false),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("simulated outage"));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> CollectionStore<R> for Probe<R> {
    fn query_all(&self) -> LiveQuery<R> {
        self.inner.query_all()
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<Option<R>, StoreError> {
        self.inner.find_by_id(id).await
    }

    async fn insert(&self, record: R) -> Result<RecordId, StoreError> {
        self.check()?;
        self.inner.insert(record).await
    }

    async fn update(&self, id: &RecordId, patch: R::Patch) -> Result<R, StoreError> {
        self.check()?;
        self.inner.update(id, patch).await
    }
}

/// Audit port that always fails.
pub struct BrokenAudit;

#[async_trait]
impl AuditPort for BrokenAudit {
    async fn append(&self, _draft: AuditDraft) -> Result<AuditLogEntry, DomainError> {
        Err(DomainError::store_unavailable("audit log offline"))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PortalDomainEvent>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<PortalDomainEvent> {
        self.events.lock().clone()
    }
}

impl EventPublisher<PortalDomainEvent> for RecordingPublisher {
    fn publish(&self, event: &PortalDomainEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Everything a dispatcher or dashboard test needs, backed by the in-memory store.
pub struct Harness {
    pub memory: InMemoryStore,
    pub courses: Arc<Probe<CourseRecord>>,
    pub enrollments: Arc<Probe<EnrollmentRecord>>,
    pub chat_messages: Arc<Probe<portal_core::contract::model::ChatMessageRecord>>,
    pub identity: Arc<StaticIdentity>,
    pub events: Arc<RecordingPublisher>,
    pub dispatcher: Arc<ActionDispatcher>,
}

pub struct HarnessOptions {
    pub actor: Option<Actor>,
    pub role: Role,
    pub broken_audit: bool,
    pub clock: Arc<dyn Clock>,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            actor: Some(tutor()),
            role: Role::Tutor,
            broken_audit: false,
            clock: Arc::new(StepClock::new()),
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::with(HarnessOptions::default())
    }

    pub fn anonymous() -> Self {
        Self::with(HarnessOptions {
            actor: None,
            ..HarnessOptions::default()
        })
    }

    pub fn with(opts: HarnessOptions) -> Self {
        let memory = InMemoryStore::new();
        let courses = Arc::new(Probe::new(memory.courses.clone()));
        let enrollments = Arc::new(Probe::new(memory.enrollments.clone()));
        let chat_messages = Arc::new(Probe::new(memory.chat_messages.clone()));

        let store = PortalStore {
            courses: courses.clone(),
            enrollments: enrollments.clone(),
            chat_messages: chat_messages.clone(),
            ..memory.portal_store()
        };

        let identity = Arc::new(match opts.actor {
            Some(actor) => StaticIdentity::signed_in(actor),
            None => StaticIdentity::anonymous(),
        });
        let audit: Arc<dyn AuditPort> = if opts.broken_audit {
            Arc::new(BrokenAudit)
        } else {
            Arc::new(StoreAuditLogger::new(
                memory.audit_logs.clone(),
                opts.clock.clone(),
            ))
        };
        let events = Arc::new(RecordingPublisher::default());
        let config = DispatcherConfig {
            role: opts.role,
            ..DispatcherConfig::default()
        };
        let dispatcher = Arc::new(ActionDispatcher::new(
            store,
            identity.clone(),
            audit,
            events.clone(),
            opts.clock,
            config,
        ));

        Self {
            memory,
            courses,
            enrollments,
            chat_messages,
            identity,
            events,
            dispatcher,
        }
    }

    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        (*self.memory.audit_logs.snapshot()).clone()
    }

    pub async fn seed_users(&self, users: Vec<UserRecord>) {
        for u in users {
            self.memory.users.insert(u).await.unwrap();
        }
    }

    pub async fn seed_course(&self, c: CourseRecord) {
        self.memory.courses.insert(c).await.unwrap();
    }

    pub async fn seed_enrollment(&self, e: EnrollmentRecord) {
        self.memory.enrollments.insert(e).await.unwrap();
    }
}
