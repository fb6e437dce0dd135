//! Presentation-facing dashboard.
//!
//! Every view is lazy: nothing is read from the store until a consumer
//! subscribes, and consumers of the same view share one store subscription.

use live_state::{
    derive_combined, derive_count, derive_filtered, derive_map, LiveCell, SharedSource,
    SharedView, Snapshot,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::contract::model::{
    Actor, ApplicationDecision, AuditLogEntry, ChatMessageRecord, ConversationKey, CourseRecord,
    EnrollmentRecord, EnrollmentStatus, RecordId, Role, Section, UserRecord,
};
use crate::domain::error::DomainError;
use crate::domain::section::SectionState;
use crate::domain::service::ActionDispatcher;

/// A pending application with its references resolved for display.
/// Names are `None` when the referenced record no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationCard {
    pub enrollment: EnrollmentRecord,
    pub student_name: Option<String>,
    pub course_title: Option<String>,
}

pub struct Dashboard {
    viewer: Actor,
    dispatcher: Arc<ActionDispatcher>,
    section: SectionState,
    selected: LiveCell<Option<RecordId>>,
    tutor_courses: SharedView<Snapshot<CourseRecord>>,
    all_students: SharedView<Snapshot<UserRecord>>,
    pending_applications: SharedView<usize>,
    application_queue: SharedView<Snapshot<ApplicationCard>>,
    selected_student: SharedView<Option<UserRecord>>,
    chat_messages: SharedView<Snapshot<ChatMessageRecord>>,
    audit_trail: SharedView<Snapshot<AuditLogEntry>>,
}

impl Dashboard {
    /// Open a dashboard for whoever is signed in right now.
    pub async fn open(dispatcher: Arc<ActionDispatcher>, grace: Duration) -> Self {
        let viewer = dispatcher.resolve_actor().await;
        Self::for_viewer(viewer, dispatcher, grace)
    }

    pub fn for_viewer(viewer: Actor, dispatcher: Arc<ActionDispatcher>, grace: Duration) -> Self {
        info!(viewer_id = %viewer.id, "opening dashboard");
        let store = dispatcher.store().clone();
        let selected = LiveCell::with_value(None::<RecordId>);
        let selection: SharedSource<Option<RecordId>> = Arc::new(selected.clone());

        let owner = viewer.id.clone();
        let tutor_courses = derive_filtered(
            "tutor_courses",
            grace,
            store.courses.query_all(),
            move |course: &CourseRecord| Ok(course.tutor_id == owner),
        );

        let all_students = derive_filtered(
            "all_students",
            grace,
            store.users.query_all(),
            |user: &UserRecord| Ok(user.role == Role::Student),
        );

        let pending_applications = derive_count(
            "pending_applications",
            grace,
            store.enrollments.query_all(),
            |enrollment: &EnrollmentRecord| Ok(enrollment.status == EnrollmentStatus::PendingReview),
        );

        // Private intermediate stage; only the outer view consumes it.
        let with_students: SharedSource<Snapshot<ApplicationCard>> = Arc::new(derive_combined(
            "application_queue.students",
            Duration::ZERO,
            store.enrollments.query_all(),
            store.users.query_all(),
            |enrollments: &Snapshot<EnrollmentRecord>, users: &Snapshot<UserRecord>| {
                let cards = enrollments
                    .iter()
                    .filter(|e| e.status == EnrollmentStatus::PendingReview)
                    .map(|e| ApplicationCard {
                        enrollment: e.clone(),
                        student_name: users
                            .iter()
                            .find(|u| u.id == e.student_id)
                            .map(|u| u.display_name.clone()),
                        course_title: None,
                    })
                    .collect::<Vec<_>>();
                Ok(Arc::new(cards))
            },
        ));
        let application_queue = derive_combined(
            "application_queue",
            grace,
            with_students,
            store.courses.query_all(),
            |cards: &Snapshot<ApplicationCard>, courses: &Snapshot<CourseRecord>| {
                let cards = cards
                    .iter()
                    .map(|card| ApplicationCard {
                        course_title: courses
                            .iter()
                            .find(|c| c.id == card.enrollment.course_id)
                            .map(|c| c.title.clone()),
                        ..card.clone()
                    })
                    .collect::<Vec<_>>();
                Ok(Arc::new(cards))
            },
        );

        let selected_student = derive_combined(
            "selected_student",
            grace,
            selection.clone(),
            store.users.query_all(),
            |selected: &Option<RecordId>, users: &Snapshot<UserRecord>| {
                Ok(selected
                    .as_ref()
                    .and_then(|id| {
                        users
                            .iter()
                            .find(|u| &u.id == id && u.role == Role::Student)
                            .cloned()
                    }))
            },
        );

        let me = viewer.id.clone();
        let chat_messages = derive_combined(
            "chat_messages",
            grace,
            selection,
            store.chat_messages.query_all(),
            move |selected: &Option<RecordId>, messages: &Snapshot<ChatMessageRecord>| {
                let Some(peer) = selected else {
                    return Ok(Arc::new(Vec::new()));
                };
                let conversation = ConversationKey::between(&me, peer);
                let mut thread = messages
                    .iter()
                    .filter(|m| m.conversation == conversation)
                    .cloned()
                    .collect::<Vec<_>>();
                // Stable: equal timestamps keep insertion order.
                thread.sort_by_key(|m| m.sent_at);
                Ok(Arc::new(thread))
            },
        );

        let audit_trail = derive_map(
            "audit_trail",
            grace,
            store.audit_logs.query_all(),
            |entries: &Snapshot<AuditLogEntry>| {
                let mut newest_first = entries.iter().rev().cloned().collect::<Vec<_>>();
                newest_first.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(Arc::new(newest_first))
            },
        );

        Self {
            viewer,
            dispatcher,
            section: SectionState::new(),
            selected,
            tutor_courses,
            all_students,
            pending_applications,
            application_queue,
            selected_student,
            chat_messages,
            audit_trail,
        }
    }

    pub fn viewer(&self) -> &Actor {
        &self.viewer
    }

    // --- views ---

    pub fn current_section(&self) -> &SectionState {
        &self.section
    }

    /// Courses owned by the viewer.
    pub fn tutor_courses(&self) -> &SharedView<Snapshot<CourseRecord>> {
        &self.tutor_courses
    }

    pub fn all_students(&self) -> &SharedView<Snapshot<UserRecord>> {
        &self.all_students
    }

    pub fn pending_applications(&self) -> &SharedView<usize> {
        &self.pending_applications
    }

    pub fn application_queue(&self) -> &SharedView<Snapshot<ApplicationCard>> {
        &self.application_queue
    }

    pub fn selected_student(&self) -> &SharedView<Option<UserRecord>> {
        &self.selected_student
    }

    /// Conversation between the viewer and the selected student.
    pub fn chat_messages(&self) -> &SharedView<Snapshot<ChatMessageRecord>> {
        &self.chat_messages
    }

    pub fn audit_trail(&self) -> &SharedView<Snapshot<AuditLogEntry>> {
        &self.audit_trail
    }

    pub fn selected_id(&self) -> Option<RecordId> {
        self.selected.get().flatten()
    }

    // --- actions ---

    pub fn set_section(&self, section: Section) {
        self.section.set_section(section);
    }

    pub fn select_student(&self, student_id: &str) -> Result<(), DomainError> {
        let id = RecordId::parse(student_id).map_err(|e| DomainError::invalid_id("student_id", e))?;
        debug!(student_id = %id, "student selected");
        self.selected.set_if_changed(Some(id));
        Ok(())
    }

    pub fn clear_selection(&self) {
        self.selected.set_if_changed(None);
    }

    pub async fn update_course_content(
        &self,
        course_id: &str,
        content: &str,
    ) -> Result<CourseRecord, DomainError> {
        self.dispatcher.update_course_content(course_id, content).await
    }

    pub async fn send_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<ChatMessageRecord, DomainError> {
        self.dispatcher.send_message(recipient_id, text).await
    }

    pub async fn send_message_to_selected(
        &self,
        text: &str,
    ) -> Result<ChatMessageRecord, DomainError> {
        let Some(recipient) = self.selected_id() else {
            return Err(DomainError::invalid_argument(
                "recipient_id",
                "no student selected",
            ));
        };
        self.dispatcher.send_message(recipient.as_str(), text).await
    }

    pub async fn create_course(
        &self,
        title: &str,
        department: &str,
    ) -> Result<CourseRecord, DomainError> {
        self.dispatcher.create_course(title, department).await
    }

    pub async fn apply_to_course(&self, course_id: &str) -> Result<EnrollmentRecord, DomainError> {
        self.dispatcher.apply_to_course(course_id).await
    }

    pub async fn review_application(
        &self,
        enrollment_id: &str,
        decision: ApplicationDecision,
    ) -> Result<EnrollmentRecord, DomainError> {
        self.dispatcher.review_application(enrollment_id, decision).await
    }
}
