//! Lazily connected, reference-counted views.
//!
//! A [`SharedView`] owns at most one upstream subscription. The upstream is
//! connected when the first consumer arrives and is kept warm for a grace
//! period after the last consumer leaves, so a consumer that briefly goes away
//! and comes back reuses it instead of triggering a fresh query.

use parking_lot::{Mutex, ReentrantMutex};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{Delivery, Listener, LiveCell, LiveSource, LiveStream, Subscription, ViewError};

type Connector<T> = Box<dyn Fn(ViewSink<T>) -> Subscription + Send + Sync>;

pub struct SharedView<T> {
    inner: Arc<SharedInner<T>>,
}

struct SharedInner<T> {
    name: Arc<str>,
    grace: Duration,
    cell: LiveCell<Delivery<T>>,
    connect: Connector<T>,
    // Serializes connect against release so a retired snapshot never
    // overwrites a fresh one.
    lifecycle: ReentrantMutex<()>,
    state: Mutex<SharedState>,
}

#[derive(Default)]
struct SharedState {
    consumers: usize,
    upstream: Option<Subscription>,
    connecting: bool,
    pending_release: Option<CancellationToken>,
    terminated: bool,
    activations: u64,
}

/// Write side handed to a view's connector.
pub struct ViewSink<T> {
    inner: Weak<SharedInner<T>>,
}

impl<T> Clone for ViewSink<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ViewSink<T> {
    /// Publish a new value; equal consecutive values are not re-delivered.
    pub fn emit(&self, value: T) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if inner.state.lock().terminated {
            return;
        }
        inner.cell.set_if_changed(Ok(value));
    }

    /// Deliver `error` and terminate the view.
    pub fn fail(&self, error: ViewError) {
        if let Some(inner) = self.inner.upgrade() {
            inner.terminate(error);
        }
    }
}

impl<T> Clone for SharedView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SharedView<T> {
    /// `connect` is called each time the view (re)activates and must return
    /// the upstream subscription feeding the sink.
    pub fn new<F>(name: impl Into<Arc<str>>, grace: Duration, connect: F) -> Self
    where
        F: Fn(ViewSink<T>) -> Subscription + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SharedInner {
                name: name.into(),
                grace,
                cell: LiveCell::new(),
                connect: Box::new(connect),
                lifecycle: ReentrantMutex::new(()),
                state: Mutex::new(SharedState::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Delivery<T>) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    pub fn subscribe_listener(&self, listener: Listener<Delivery<T>>) -> Subscription {
        let needs_connect = {
            let mut state = self.inner.state.lock();
            state.consumers += 1;
            if let Some(pending) = state.pending_release.take() {
                pending.cancel();
                debug!(view = %self.inner.name, "reusing warm upstream");
            }
            let needs = state.upstream.is_none() && !state.connecting && !state.terminated;
            if needs {
                state.connecting = true;
                state.activations += 1;
            }
            needs
        };
        if needs_connect {
            self.inner.connect_upstream();
        }

        let delivery = self.inner.cell.subscribe_listener(listener);
        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            drop(delivery);
            if let Some(inner) = weak.upgrade() {
                inner.release_consumer();
            }
        })
    }

    /// Last delivery while the view holds an upstream, or the error that terminated it.
    /// `None` once the view has been released.
    pub fn latest(&self) -> Option<Delivery<T>> {
        self.inner.cell.get()
    }

    /// Latest successful value, if any.
    pub fn value(&self) -> Option<T> {
        self.latest().and_then(Result::ok)
    }

    pub fn consumer_count(&self) -> usize {
        self.inner.state.lock().consumers
    }

    /// Whether the upstream subscription is currently held.
    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().upstream.is_some()
    }

    /// How many times the upstream has been connected.
    pub fn activations(&self) -> u64 {
        self.inner.state.lock().activations
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.state.lock().terminated
    }

    pub fn stream(&self) -> LiveStream<Delivery<T>> {
        LiveStream::from_source(self)
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> LiveSource<T> for SharedView<T> {
    fn observe(&self, listener: Listener<Delivery<T>>) -> Subscription {
        self.subscribe_listener(listener)
    }
}

impl<T: Clone + PartialEq + Send + Sync + 'static> SharedInner<T> {
    fn connect_upstream(self: &Arc<Self>) {
        let _lifecycle = self.lifecycle.lock();
        debug!(view = %self.name, "connecting upstream");
        self.cell.clear();
        let sink = ViewSink {
            inner: Arc::downgrade(self),
        };
        let upstream = (self.connect)(sink);

        // The connector may have delivered a failure synchronously.
        let rejected = {
            let mut state = self.state.lock();
            state.connecting = false;
            if state.terminated {
                Some(upstream)
            } else {
                state.upstream = Some(upstream);
                None
            }
        };
        drop(rejected);
    }

    fn release_consumer(self: &Arc<Self>) {
        let _lifecycle = self.lifecycle.lock();
        let (handle, token) = {
            let mut state = self.state.lock();
            state.consumers = state.consumers.saturating_sub(1);
            if state.consumers > 0 || state.upstream.is_none() {
                return;
            }
            let runtime = tokio::runtime::Handle::try_current().ok();
            match runtime {
                Some(handle) if !self.grace.is_zero() => {
                    let token = CancellationToken::new();
                    state.pending_release = Some(token.clone());
                    (handle, token)
                }
                _ => {
                    let upstream = state.upstream.take();
                    drop(state);
                    self.retire(upstream);
                    debug!(view = %self.name, "released upstream");
                    return;
                }
            }
        };

        let weak = Arc::downgrade(self);
        let grace = self.grace;
        handle.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(grace) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.finish_release(&token);
                    }
                }
            }
        });
    }

    fn finish_release(&self, token: &CancellationToken) {
        let _lifecycle = self.lifecycle.lock();
        let upstream = {
            let mut state = self.state.lock();
            if token.is_cancelled() || state.consumers > 0 {
                return;
            }
            state.pending_release = None;
            state.upstream.take()
        };
        if upstream.is_some() {
            self.retire(upstream);
            debug!(view = %self.name, grace_ms = self.grace.as_millis() as u64, "released idle upstream");
        }
    }

    /// Drop the upstream and forget the last snapshot; a released view has no value.
    fn retire(&self, upstream: Option<Subscription>) {
        drop(upstream);
        self.cell.clear();
    }

    fn terminate(&self, error: ViewError) {
        let upstream = {
            let mut state = self.state.lock();
            if state.terminated {
                return;
            }
            state.terminated = true;
            if let Some(pending) = state.pending_release.take() {
                pending.cancel();
            }
            state.upstream.take()
        };
        warn!(view = %self.name, error = %error, "view terminated");
        self.cell.set(Err(error));
        drop(upstream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Upstream backed by a cell, counting how often it gets connected.
    fn counting_view(
        source: &LiveCell<u32>,
        grace: Duration,
    ) -> (SharedView<u32>, Arc<AtomicUsize>) {
        let connects = Arc::new(AtomicUsize::new(0));
        let counter = connects.clone();
        let upstream = source.clone();
        let view = SharedView::new("numbers", grace, move |sink: ViewSink<u32>| {
            counter.fetch_add(1, Ordering::SeqCst);
            upstream.subscribe(move |v: &u32| sink.emit(*v))
        });
        (view, connects)
    }

    #[test]
    fn upstream_is_not_connected_until_first_consumer() {
        let source = LiveCell::with_value(1);
        let (view, connects) = counting_view(&source, Duration::ZERO);
        assert!(!view.is_connected());
        assert_eq!(source.listener_count(), 0);

        let _sub = view.subscribe(|_| {});
        assert!(view.is_connected());
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(source.listener_count(), 1);
    }

    #[test]
    fn consumers_share_one_upstream() {
        let source = LiveCell::with_value(1);
        let (view, connects) = counting_view(&source, Duration::ZERO);
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));

        let a = seen_a.clone();
        let _sub_a = view.subscribe(move |d: &Delivery<u32>| a.lock().push(d.clone()));
        let b = seen_b.clone();
        let _sub_b = view.subscribe(move |d: &Delivery<u32>| b.lock().push(d.clone()));
        source.set(2);
        source.set(3);

        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(source.listener_count(), 1);
        assert_eq!(*seen_a.lock(), vec![Ok(1), Ok(2), Ok(3)]);
        assert_eq!(*seen_a.lock(), *seen_b.lock());
    }

    #[test]
    fn equal_values_are_not_redelivered() {
        let source = LiveCell::with_value(7);
        let (view, _) = counting_view(&source, Duration::ZERO);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let _sub = view.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        source.set(7);
        source.set(7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_grace_releases_immediately() {
        let source = LiveCell::with_value(1);
        let (view, _) = counting_view(&source, Duration::ZERO);
        let sub = view.subscribe(|_| {});
        drop(sub);
        assert!(!view.is_connected());
        assert_eq!(source.listener_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn resubscribe_within_grace_reuses_upstream() {
        let source = LiveCell::with_value(1);
        let (view, connects) = counting_view(&source, Duration::from_secs(5));

        let sub = view.subscribe(|_| {});
        drop(sub);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(view.is_connected(), "upstream stays warm during grace");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = view.subscribe(move |d: &Delivery<u32>| s.lock().push(d.clone()));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(view.is_connected());
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![Ok(1)]);
    }

    #[test]
    fn released_view_forgets_its_snapshot() {
        let source = LiveCell::with_value(1);
        let (view, _) = counting_view(&source, Duration::ZERO);

        let sub = view.subscribe(|_| {});
        assert_eq!(view.value(), Some(1));
        drop(sub);
        source.set(2);

        assert_eq!(view.latest(), None);
        let _sub = view.subscribe(|_| {});
        assert_eq!(view.value(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_upstream_released_after_grace() {
        let source = LiveCell::with_value(1);
        let (view, connects) = counting_view(&source, Duration::from_secs(5));

        drop(view.subscribe(|_| {}));
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert!(!view.is_connected());
        assert_eq!(source.listener_count(), 0);

        let _sub = view.subscribe(|_| {});
        assert_eq!(connects.load(Ordering::SeqCst), 2);
        assert_eq!(view.activations(), 2);
    }

    #[test]
    fn failure_terminates_view_and_replays_to_late_subscribers() {
        let source = LiveCell::with_value(1u32);
        let upstream = source.clone();
        let view = SharedView::new("checked", Duration::ZERO, move |sink: ViewSink<u32>| {
            upstream.subscribe(move |v: &u32| {
                if *v > 2 {
                    sink.fail(ViewError::derivation("checked", "too large"));
                } else {
                    sink.emit(*v);
                }
            })
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = view.subscribe(move |d: &Delivery<u32>| s.lock().push(d.clone()));
        source.set(3);
        source.set(1);

        assert!(view.is_terminated());
        assert_eq!(source.listener_count(), 0);
        assert_eq!(
            *seen.lock(),
            vec![Ok(1), Err(ViewError::derivation("checked", "too large"))]
        );

        let late = Arc::new(Mutex::new(Vec::new()));
        let l = late.clone();
        let _late = view.subscribe(move |d: &Delivery<u32>| l.lock().push(d.clone()));
        assert_eq!(late.lock().len(), 1);
        assert!(late.lock()[0].is_err());
    }

    #[tracing_test::traced_test]
    #[test]
    fn termination_is_logged() {
        let source = LiveCell::with_value(0u32);
        let upstream = source.clone();
        let view = SharedView::new("guarded", Duration::ZERO, move |sink: ViewSink<u32>| {
            upstream.subscribe(move |v: &u32| {
                if *v == 0 {
                    sink.emit(*v);
                } else {
                    sink.fail(ViewError::upstream("source closed"));
                }
            })
        });

        let _sub = view.subscribe(|_| {});
        source.set(1);

        assert!(view.is_terminated());
        assert!(logs_contain("view terminated"));
        assert!(logs_contain("guarded"));
    }
}
