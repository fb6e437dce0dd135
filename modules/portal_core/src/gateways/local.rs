use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::PortalActionsApi,
    error::PortalError,
    model::{ApplicationDecision, ChatMessageRecord, CourseRecord, EnrollmentRecord},
};
use crate::domain::service::ActionDispatcher;

/// Local implementation of the PortalActionsApi trait that delegates to the dispatcher
pub struct PortalLocalClient {
    dispatcher: Arc<ActionDispatcher>,
}

impl PortalLocalClient {
    pub fn new(dispatcher: Arc<ActionDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl PortalActionsApi for PortalLocalClient {
    async fn update_course_content(
        &self,
        course_id: &str,
        content: &str,
    ) -> Result<CourseRecord, PortalError> {
        self.dispatcher
            .update_course_content(course_id, content)
            .await
            .map_err(Into::into)
    }

    async fn send_message(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<ChatMessageRecord, PortalError> {
        self.dispatcher
            .send_message(recipient_id, text)
            .await
            .map_err(Into::into)
    }

    async fn create_course(
        &self,
        title: &str,
        department: &str,
    ) -> Result<CourseRecord, PortalError> {
        self.dispatcher
            .create_course(title, department)
            .await
            .map_err(Into::into)
    }

    async fn apply_to_course(&self, course_id: &str) -> Result<EnrollmentRecord, PortalError> {
        self.dispatcher
            .apply_to_course(course_id)
            .await
            .map_err(Into::into)
    }

    async fn review_application(
        &self,
        enrollment_id: &str,
        decision: ApplicationDecision,
    ) -> Result<EnrollmentRecord, PortalError> {
        self.dispatcher
            .review_application(enrollment_id, decision)
            .await
            .map_err(Into::into)
    }
}
