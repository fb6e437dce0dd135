use chrono::{DateTime, Utc};

use crate::contract::model::{EnrollmentStatus, RecordId};

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalDomainEvent {
    CourseCreated {
        course_id: RecordId,
        tutor_id: RecordId,
        at: DateTime<Utc>,
    },
    CourseContentUpdated {
        course_id: RecordId,
        at: DateTime<Utc>,
    },
    MessageSent {
        message_id: RecordId,
        sender_id: RecordId,
        recipient_id: RecordId,
        at: DateTime<Utc>,
    },
    ApplicationSubmitted {
        enrollment_id: RecordId,
        course_id: RecordId,
        student_id: RecordId,
        at: DateTime<Utc>,
    },
    ApplicationReviewed {
        enrollment_id: RecordId,
        status: EnrollmentStatus,
        at: DateTime<Utc>,
    },
}
