use std::fmt;

/// Handle for an active listener registration.
///
/// Dropping the handle unregisters the listener. Use [`Subscription::cancel`]
/// to make the intent explicit at the call site.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that owns nothing.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Bundle several subscriptions; they are cancelled in the order given.
    pub fn merge(parts: impl IntoIterator<Item = Subscription>) -> Self {
        let parts: Vec<Subscription> = parts.into_iter().collect();
        Self::new(move || drop(parts))
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
