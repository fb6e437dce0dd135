use futures::Stream;
use live_state::Broadcaster;
use tracing::trace;

use crate::domain::events::PortalDomainEvent;
use crate::domain::ports::EventPublisher;

/// Fans domain events out to in-process listeners (notification handlers,
/// the demo CLI). Events published with no listener attached are dropped.
#[derive(Clone)]
pub struct BroadcastEventPublisher {
    out: Broadcaster<PortalDomainEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            out: Broadcaster::new(capacity),
        }
    }

    pub fn subscribe(&self) -> impl Stream<Item = PortalDomainEvent> {
        self.out.subscribe_stream()
    }

    pub fn listener_count(&self) -> usize {
        self.out.receiver_count()
    }
}

impl EventPublisher<PortalDomainEvent> for BroadcastEventPublisher {
    fn publish(&self, event: &PortalDomainEvent) {
        trace!(?event, "publishing domain event");
        self.out.send(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::RecordId;
    use chrono::Utc;
    use futures::StreamExt;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn listener_receives_published_event() {
        let publisher = BroadcastEventPublisher::new(8);
        let mut events = Box::pin(publisher.subscribe());
        assert_eq!(publisher.listener_count(), 1);

        let event = PortalDomainEvent::CourseContentUpdated {
            course_id: RecordId::parse("c1").unwrap(),
            at: Utc::now(),
        };
        publisher.publish(&event);

        let got = timeout(Duration::from_secs(1), events.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, event);
    }
}
