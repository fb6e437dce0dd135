use async_trait::async_trait;

use crate::contract::model::{Actor, AuditLogEntry, LogType, RecordId};
use crate::domain::error::DomainError;

/// Everything an audit entry needs except the store-assigned id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub actor: Actor,
    pub action: &'static str,
    pub target_id: RecordId,
    pub details: String,
    pub log_type: LogType,
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditPort: Send + Sync {
    async fn append(&self, draft: AuditDraft) -> Result<AuditLogEntry, DomainError>;
}
