use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{Delivery, LiveSource, Subscription};

/// Async view over a live source.
///
/// The underlying subscription lives exactly as long as the stream; dropping
/// the stream unsubscribes. Buffering is unbounded, so a consumer that stops
/// polling should drop the stream.
pub struct LiveStream<T> {
    rx: UnboundedReceiverStream<T>,
    _subscription: Subscription,
}

impl<T: Send + 'static> LiveStream<T> {
    pub(crate) fn attach(
        subscribe: impl FnOnce(mpsc::UnboundedSender<T>) -> Subscription,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = subscribe(tx);
        Self {
            rx: UnboundedReceiverStream::new(rx),
            _subscription: subscription,
        }
    }
}

impl<T: Clone + Send + Sync + 'static> LiveStream<Delivery<T>> {
    /// Stream every delivery of `source`, errors included.
    pub fn from_source<S>(source: &S) -> Self
    where
        S: LiveSource<T> + ?Sized,
    {
        Self::attach(|tx| {
            source.observe(std::sync::Arc::new(move |delivery: &Delivery<T>| {
                let _ = tx.send(delivery.clone());
            }))
        })
    }
}

impl<T> Stream for LiveStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        Pin::new(&mut self.get_mut().rx).poll_next(cx)
    }
}
