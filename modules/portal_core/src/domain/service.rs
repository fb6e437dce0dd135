use std::sync::Arc;

use crate::contract::model::{
    Actor, ApplicationDecision, ChatMessageRecord, ConversationKey, CoursePatch, CourseRecord,
    EnrollmentPatch, EnrollmentRecord, EnrollmentStatus, LogType, RecordId, Role,
};
use crate::domain::error::DomainError;
use crate::domain::events::PortalDomainEvent;
use crate::domain::ports::{AuditDraft, AuditPort, Clock, EventPublisher, IdentityProvider};
use crate::domain::repo::PortalStore;
use tracing::{debug, info, instrument, warn};

pub const UPDATE_CONTENT: &str = "UPDATE_CONTENT";
pub const SEND_MESSAGE: &str = "SEND_MESSAGE";
pub const CREATE_COURSE: &str = "CREATE_COURSE";
pub const APPLY_COURSE: &str = "APPLY_COURSE";

/// Executes every state-mutating portal action.
///
/// Each action validates its input, performs a single store mutation, appends
/// one audit entry and publishes a domain event. Only the dispatcher's acting
/// role and collaborators are held; identity is asked for on every action.
#[derive(Clone)]
pub struct ActionDispatcher {
    store: PortalStore,
    identity: Arc<dyn IdentityProvider>,
    audit: Arc<dyn AuditPort>,
    events: Arc<dyn EventPublisher<PortalDomainEvent>>,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

/// Configuration for the action dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub role: Role,
    pub max_message_length: usize,
    pub max_content_length: usize,
    pub max_title_length: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            role: Role::Tutor,
            max_message_length: 2000,
            max_content_length: 20_000,
            max_title_length: 200,
        }
    }
}

impl ActionDispatcher {
    pub fn new(
        store: PortalStore,
        identity: Arc<dyn IdentityProvider>,
        audit: Arc<dyn AuditPort>,
        events: Arc<dyn EventPublisher<PortalDomainEvent>>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            store,
            identity,
            audit,
            events,
            clock,
            config,
        }
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn store(&self) -> &PortalStore {
        &self.store
    }

    /// The signed-in actor, or the role placeholder when nobody is.
    pub async fn resolve_actor(&self) -> Actor {
        match self.identity.current_actor().await {
            Some(actor) => actor,
            None => {
                debug!(role = ?self.config.role, "no signed-in actor, using placeholder");
                Actor::placeholder(self.config.role)
            }
        }
    }

    #[instrument(
        name = "portal_core.dispatcher.update_course_content",
        skip(self, content),
        fields(course_id = %course_id, content_len = content.len())
    )]
    pub async fn update_course_content(
        &self,
        course_id: &str,
        content: &str,
    ) -> Result<CourseRecord, DomainError> {
        info!("Updating course content");

        let id = parse_id("course_id", course_id)?;
        validate_text("content", content, self.config.max_content_length)?;

        let now = self.clock.now();
        let patch = CoursePatch {
            content: Some(content.to_string()),
            updated_at: Some(now),
            ..CoursePatch::default()
        };
        let course = self.store.courses.update(&id, patch).await?;

        let actor = self.resolve_actor().await;
        self.record_audit(
            actor,
            UPDATE_CONTENT,
            course.id.clone(),
            format!("Updated content of '{}'", course.title),
        )
        .await;

        self.events.publish(&PortalDomainEvent::CourseContentUpdated {
            course_id: course.id.clone(),
            at: now,
        });

        info!("Successfully updated course content");
        Ok(course)
    }

    #[instrument(
        name = "portal_core.dispatcher.send_message",
        skip(self, text),
        fields(recipient_id = %recipient_id, text_len = text.len())
    )]
    pub async fn send_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<ChatMessageRecord, DomainError> {
        info!("Sending message");

        let recipient = parse_id("recipient_id", recipient_id)?;
        validate_text("text", text, self.config.max_message_length)?;

        let sender = self.resolve_actor().await;
        if sender.id == recipient {
            return Err(DomainError::invalid_argument(
                "recipient_id",
                "cannot send a message to yourself",
            ));
        }

        let mut message = ChatMessageRecord {
            id: RecordId::UNASSIGNED,
            sender_id: sender.id.clone(),
            conversation: ConversationKey::between(&sender.id, &recipient),
            text: text.to_string(),
            sent_at: self.clock.now(),
        };
        message.id = self.store.chat_messages.insert(message.clone()).await?;

        self.record_audit(
            sender,
            SEND_MESSAGE,
            recipient.clone(),
            format!("Sent a message ({} characters)", text.chars().count()),
        )
        .await;

        self.events.publish(&PortalDomainEvent::MessageSent {
            message_id: message.id.clone(),
            sender_id: message.sender_id.clone(),
            recipient_id: recipient,
            at: message.sent_at,
        });

        info!(message_id = %message.id, "Successfully sent message");
        Ok(message)
    }

    #[instrument(
        name = "portal_core.dispatcher.create_course",
        skip(self),
        fields(title = %title, department = %department)
    )]
    pub async fn create_course(
        &self,
        title: &str,
        department: &str,
    ) -> Result<CourseRecord, DomainError> {
        info!("Creating course");

        validate_text("title", title, self.config.max_title_length)?;
        validate_text("department", department, self.config.max_title_length)?;

        let owner = self.resolve_actor().await;
        let mut course = CourseRecord {
            id: RecordId::UNASSIGNED,
            title: title.trim().to_string(),
            department: department.trim().to_string(),
            tutor_id: owner.id.clone(),
            content: String::new(),
            updated_at: self.clock.now(),
        };
        course.id = self.store.courses.insert(course.clone()).await?;

        self.record_audit(
            owner,
            CREATE_COURSE,
            course.id.clone(),
            format!("Created course '{}' in {}", course.title, course.department),
        )
        .await;

        self.events.publish(&PortalDomainEvent::CourseCreated {
            course_id: course.id.clone(),
            tutor_id: course.tutor_id.clone(),
            at: course.updated_at,
        });

        info!(course_id = %course.id, "Successfully created course");
        Ok(course)
    }

    #[instrument(
        name = "portal_core.dispatcher.apply_to_course",
        skip(self),
        fields(course_id = %course_id)
    )]
    pub async fn apply_to_course(&self, course_id: &str) -> Result<EnrollmentRecord, DomainError> {
        info!("Applying to course");

        let course = parse_id("course_id", course_id)?;

        let applicant = self.resolve_actor().await;
        let mut enrollment = EnrollmentRecord {
            id: RecordId::UNASSIGNED,
            student_id: applicant.id.clone(),
            course_id: course.clone(),
            status: EnrollmentStatus::PendingReview,
            applied_at: self.clock.now(),
        };
        enrollment.id = self.store.enrollments.insert(enrollment.clone()).await?;

        self.record_audit(
            applicant,
            APPLY_COURSE,
            course,
            format!("Submitted application {}", enrollment.id),
        )
        .await;

        self.events.publish(&PortalDomainEvent::ApplicationSubmitted {
            enrollment_id: enrollment.id.clone(),
            course_id: enrollment.course_id.clone(),
            student_id: enrollment.student_id.clone(),
            at: enrollment.applied_at,
        });

        info!(enrollment_id = %enrollment.id, "Successfully applied to course");
        Ok(enrollment)
    }

    #[instrument(
        name = "portal_core.dispatcher.review_application",
        skip(self),
        fields(enrollment_id = %enrollment_id, decision = ?decision)
    )]
    pub async fn review_application(
        &self,
        enrollment_id: &str,
        decision: ApplicationDecision,
    ) -> Result<EnrollmentRecord, DomainError> {
        info!("Reviewing application");

        let id = parse_id("enrollment_id", enrollment_id)?;
        let patch = EnrollmentPatch {
            status: decision.status(),
        };
        let enrollment = self.store.enrollments.update(&id, patch).await?;

        let actor = self.resolve_actor().await;
        self.record_audit(
            actor,
            decision.action_code(),
            enrollment.id.clone(),
            format!(
                "Application of {} to course {} is now {}",
                enrollment.student_id, enrollment.course_id, enrollment.status
            ),
        )
        .await;

        self.events.publish(&PortalDomainEvent::ApplicationReviewed {
            enrollment_id: enrollment.id.clone(),
            status: enrollment.status,
            at: self.clock.now(),
        });

        info!("Successfully reviewed application");
        Ok(enrollment)
    }

    /// Audit failures never undo or fail the action that was already stored.
    async fn record_audit(
        &self,
        actor: Actor,
        action: &'static str,
        target_id: RecordId,
        details: String,
    ) {
        let draft = AuditDraft {
            actor,
            action,
            target_id,
            details,
            log_type: LogType::from(self.config.role),
        };
        match self.audit.append(draft).await {
            Ok(entry) => debug!(audit_id = %entry.id, action, "audit entry appended"),
            Err(e) => warn!(action, error = %e, "Audit append failed (continuing)"),
        }
    }
}

// --- validation helpers ---

fn parse_id(field: &str, raw: &str) -> Result<RecordId, DomainError> {
    RecordId::parse(raw).map_err(|e| DomainError::invalid_id(field, e))
}

fn validate_text(field: &str, text: &str, max: usize) -> Result<(), DomainError> {
    if text.trim().is_empty() {
        return Err(DomainError::invalid_argument(field, "must not be blank"));
    }
    let len = text.chars().count();
    if len > max {
        return Err(DomainError::invalid_argument(
            field,
            format!("too long: {len} characters (max: {max})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_oversized_text_is_rejected() {
        assert!(validate_text("text", "   ", 10).is_err());
        assert!(validate_text("text", "", 10).is_err());
        assert!(validate_text("text", "hello", 5).is_ok());
        assert!(validate_text("text", "hello!", 5).is_err());
        // Limits count characters, not bytes.
        assert!(validate_text("text", "ééééé", 5).is_ok());
    }

    #[test]
    fn malformed_ids_name_the_field() {
        let err = parse_id("course_id", "not an id").unwrap_err();
        match err {
            DomainError::InvalidArgument { field, .. } => assert_eq!(field, "course_id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
