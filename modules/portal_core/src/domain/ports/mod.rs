pub mod audit;
pub mod clock;
pub mod identity;

pub use audit::{AuditDraft, AuditPort};
pub use clock::{Clock, SystemClock};
pub use identity::IdentityProvider;

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}
