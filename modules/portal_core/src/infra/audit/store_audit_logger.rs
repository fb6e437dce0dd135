use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

use crate::contract::model::{AuditLogEntry, RecordId};
use crate::domain::error::DomainError;
use crate::domain::ports::{AuditDraft, AuditPort, Clock};
use crate::domain::repo::CollectionStore;

/// Audit adapter that appends entries to the `auditLogs` collection.
pub struct StoreAuditLogger {
    logs: Arc<dyn CollectionStore<AuditLogEntry>>,
    clock: Arc<dyn Clock>,
}

impl StoreAuditLogger {
    pub fn new(logs: Arc<dyn CollectionStore<AuditLogEntry>>, clock: Arc<dyn Clock>) -> Self {
        Self { logs, clock }
    }
}

#[async_trait]
impl AuditPort for StoreAuditLogger {
    #[instrument(
        name = "portal_core.audit.append",
        skip_all,
        fields(action = draft.action, target_id = %draft.target_id)
    )]
    async fn append(&self, draft: AuditDraft) -> Result<AuditLogEntry, DomainError> {
        let mut entry = AuditLogEntry {
            id: RecordId::UNASSIGNED,
            actor_id: draft.actor.id,
            actor_name: draft.actor.display_name,
            action: draft.action.to_string(),
            target_id: draft.target_id,
            details: draft.details,
            log_type: draft.log_type,
            created_at: self.clock.now(),
        };
        entry.id = self.logs.insert(entry.clone()).await?;
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{Actor, LogType, Role};
    use crate::domain::ports::SystemClock;
    use crate::infra::storage::memory_store::MemoryCollection;

    #[tokio::test]
    async fn concurrent_appends_get_distinct_entries() {
        let logs = Arc::new(MemoryCollection::<AuditLogEntry>::new());
        let logger = Arc::new(StoreAuditLogger::new(logs.clone(), Arc::new(SystemClock::new())));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let logger = logger.clone();
            tasks.push(tokio::spawn(async move {
                logger
                    .append(AuditDraft {
                        actor: Actor::placeholder(Role::Tutor),
                        action: "UPDATE_CONTENT",
                        target_id: RecordId::parse("c1").unwrap(),
                        details: "same details".into(),
                        log_type: LogType::Tutor,
                    })
                    .await
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().id);
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 16);
        assert_eq!(logs.len(), 16);
    }
}
