use async_trait::async_trait;
use parking_lot::RwLock;

use crate::contract::model::Actor;
use crate::domain::ports::IdentityProvider;

/// Identity held in process, switched by explicit sign-in / sign-out.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    current: RwLock<Option<Actor>>,
}

impl StaticIdentity {
    pub fn signed_in(actor: Actor) -> Self {
        Self {
            current: RwLock::new(Some(actor)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, actor: Actor) {
        *self.current.write() = Some(actor);
    }

    pub fn sign_out(&self) {
        *self.current.write() = None;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_actor(&self) -> Option<Actor> {
        self.current.read().clone()
    }
}
