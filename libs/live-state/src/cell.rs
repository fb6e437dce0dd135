use parking_lot::{Mutex, ReentrantMutex};
use std::sync::Arc;

use crate::{Delivery, LiveSource, LiveStream, Subscription};

/// Callback registered on a live value.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A mutable value with synchronously notified listeners.
///
/// - A new listener receives the current value (if set) before `subscribe` returns.
/// - Deliveries are serialized: every listener observes the same sequence.
/// - Listeners run on the thread that calls `set`; they must not block.
/// - Listeners run with this cell's delivery gate held. They must not subscribe
///   to other views or set other cells: another thread doing the reverse takes
///   the same gates in opposite order and deadlocks. Hand such work off to a
///   task instead.
pub struct LiveCell<T> {
    inner: Arc<CellInner<T>>,
}

struct CellInner<T> {
    // Held for the whole delivery; reentrant so a listener may subscribe or set again.
    gate: ReentrantMutex<()>,
    state: Mutex<CellState<T>>,
}

struct CellState<T> {
    current: Option<T>,
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
}

impl<T> Clone for LiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for LiveCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> LiveCell<T> {
    pub fn new() -> Self {
        Self::from_current(None)
    }

    pub fn with_value(value: T) -> Self {
        Self::from_current(Some(value))
    }

    fn from_current(current: Option<T>) -> Self {
        Self {
            inner: Arc::new(CellInner {
                gate: ReentrantMutex::new(()),
                state: Mutex::new(CellState {
                    current,
                    listeners: Vec::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.inner.state.lock().current.clone()
    }

    /// Store `value` and notify every listener, even if the value is unchanged.
    pub fn set(&self, value: T) {
        let _gate = self.inner.gate.lock();
        let listeners = {
            let mut state = self.inner.state.lock();
            state.current = Some(value.clone());
            state
                .listeners
                .iter()
                .map(|(_, l)| l.clone())
                .collect::<Vec<_>>()
        };
        for listener in listeners {
            listener(&value);
        }
    }

    /// Store and notify only when `value` differs from the current one.
    /// Returns whether a delivery happened.
    pub fn set_if_changed(&self, value: T) -> bool
    where
        T: PartialEq,
    {
        let _gate = self.inner.gate.lock();
        if self.inner.state.lock().current.as_ref() == Some(&value) {
            return false;
        }
        self.set(value);
        true
    }

    /// Forget the current value without notifying anyone.
    pub fn clear(&self) {
        let _gate = self.inner.gate.lock();
        self.inner.state.lock().current = None;
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_listener(Arc::new(listener))
    }

    pub fn subscribe_listener(&self, listener: Listener<T>) -> Subscription {
        let _gate = self.inner.gate.lock();
        let (id, current) = {
            let mut state = self.inner.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, listener.clone()));
            (id, state.current.clone())
        };
        if let Some(value) = current {
            listener(&value);
        }

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.state.lock().listeners.retain(|(lid, _)| *lid != id);
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }

    /// Observe the cell as an async stream of values.
    pub fn stream(&self) -> LiveStream<T> {
        LiveStream::attach(|tx| {
            self.subscribe(move |value: &T| {
                let _ = tx.send(value.clone());
            })
        })
    }
}

impl<T: Clone + Send + Sync + 'static> LiveSource<T> for LiveCell<T> {
    fn observe(&self, listener: Listener<Delivery<T>>) -> Subscription {
        self.subscribe(move |value: &T| listener(&Ok(value.clone())))
    }
}
