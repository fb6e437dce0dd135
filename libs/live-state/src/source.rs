use std::sync::Arc;

use crate::{Delivery, Listener, Subscription};

/// Anything a view can be derived from.
///
/// Implementations deliver the current value (if they have one) to a new
/// listener before returning, then every subsequent value in order.
pub trait LiveSource<T>: Send + Sync {
    fn observe(&self, listener: Listener<Delivery<T>>) -> Subscription;
}

pub type SharedSource<T> = Arc<dyn LiveSource<T>>;

impl<T, S> LiveSource<T> for Arc<S>
where
    S: LiveSource<T> + ?Sized,
{
    fn observe(&self, listener: Listener<Delivery<T>>) -> Subscription {
        (**self).observe(listener)
    }
}
