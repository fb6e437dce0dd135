use async_trait::async_trait;

use crate::contract::{
    error::PortalError,
    model::{ApplicationDecision, ChatMessageRecord, CourseRecord, EnrollmentRecord},
};

/// Public API trait for the portal core that other modules can use
#[async_trait]
pub trait PortalActionsApi: Send + Sync {
    /// Replace the content of a course
    async fn update_course_content(
        &self,
        course_id: &str,
        content: &str,
    ) -> Result<CourseRecord, PortalError>;

    /// Send a chat message from the current actor
    async fn send_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<ChatMessageRecord, PortalError>;

    /// Create a course owned by the current actor
    async fn create_course(&self, title: &str, department: &str)
        -> Result<CourseRecord, PortalError>;

    /// Apply the current actor to a course
    async fn apply_to_course(&self, course_id: &str) -> Result<EnrollmentRecord, PortalError>;

    /// Approve or reject a pending application
    async fn review_application(
        &self,
        enrollment_id: &str,
        decision: ApplicationDecision,
    ) -> Result<EnrollmentRecord, PortalError>;
}
