//! Reactive building blocks for UI-facing state.
//!
//! - [`LiveCell`]: a value with synchronously notified listeners.
//! - [`SharedView`]: a lazily connected, reference-counted view that fans one
//!   upstream subscription out to many consumers and releases it after an idle
//!   grace period.
//! - [`derive`]: filtered / counted / mapped / combined views over any [`LiveSource`].
//! - [`LiveStream`]: async `Stream` adapter for consumers living on the runtime.
//! - [`Broadcaster`]: bounded fire-and-forget fan-out for events.

pub mod broadcaster;
pub mod cell;
pub mod derive;
pub mod error;
pub mod shared;
pub mod source;
pub mod stream;
pub mod subscription;

use std::sync::Arc;
use std::time::Duration;

pub use broadcaster::Broadcaster;
pub use cell::{Listener, LiveCell};
pub use derive::{derive_combined, derive_count, derive_filtered, derive_map};
pub use error::{Delivery, ViewError};
pub use shared::{SharedView, ViewSink};
pub use source::{LiveSource, SharedSource};
pub use stream::LiveStream;
pub use subscription::Subscription;

/// Full, ordered contents of a collection as delivered to subscribers.
pub type Snapshot<R> = Arc<Vec<R>>;

/// Idle time after the last consumer leaves before a shared view drops its upstream.
pub const DEFAULT_RELEASE_GRACE: Duration = Duration::from_secs(5);
