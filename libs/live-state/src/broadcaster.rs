use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Fan-out of fire-and-forget notifications (domain events, change hints)
/// to any number of async listeners.
///
/// Each listener gets its own copy of every notification sent after it
/// subscribed. A listener that falls more than `capacity` notifications
/// behind loses the oldest ones and carries on from the newest.
#[derive(Clone)]
pub struct Broadcaster<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Broadcaster<T> {
    /// `capacity` is the per-listener backlog; zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Notify current listeners. Sending with nobody listening is fine.
    pub fn send(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Notifications sent from now on. Gaps from lagging are skipped silently.
    pub fn subscribe_stream(&self) -> impl Stream<Item = T> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(|res| async move { res.ok() })
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
