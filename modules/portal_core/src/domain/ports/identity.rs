use async_trait::async_trait;

use crate::contract::model::Actor;

/// Who is acting right now. `None` means nobody is signed in.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_actor(&self) -> Option<Actor>;
}
