use std::sync::Arc;

use futures::Stream;
use tracing::{debug, info};

use crate::config::PortalCoreConfig;
use crate::contract::client::PortalActionsApi;
use crate::domain::events::PortalDomainEvent;
use crate::domain::ports::{Clock, IdentityProvider, SystemClock};
use crate::domain::repo::PortalStore;
use crate::domain::service::ActionDispatcher;
use crate::gateways::local::PortalLocalClient;
use crate::infra::audit::store_audit_logger::StoreAuditLogger;
use crate::infra::events::broadcast_publisher::BroadcastEventPublisher;
use crate::views::Dashboard;

/// Wires the store and identity collaborators into the dispatcher, the
/// public client and the dashboard factory.
#[derive(Clone)]
pub struct PortalCore {
    config: PortalCoreConfig,
    dispatcher: Arc<ActionDispatcher>,
    events: BroadcastEventPublisher,
    client: Arc<dyn PortalActionsApi>,
}

impl PortalCore {
    pub fn init(
        config: PortalCoreConfig,
        store: PortalStore,
        identity: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        Self::init_with_clock(config, store, identity, Arc::new(SystemClock::new()))
    }

    pub fn init_with_clock(
        config: PortalCoreConfig,
        store: PortalStore,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        info!("Initializing portal_core module");

        anyhow::ensure!(
            config.max_message_length > 0,
            "max_message_length must be positive"
        );
        anyhow::ensure!(
            config.max_content_length > 0,
            "max_content_length must be positive"
        );
        anyhow::ensure!(
            config.max_title_length > 0,
            "max_title_length must be positive"
        );
        debug!(
            "Loaded portal_core config: role={:?}, view_grace={:?}, event_buffer={}",
            config.role, config.view_grace, config.event_buffer
        );

        let audit = Arc::new(StoreAuditLogger::new(store.audit_logs.clone(), clock.clone()));
        let events = BroadcastEventPublisher::new(config.event_buffer);
        let dispatcher = Arc::new(ActionDispatcher::new(
            store,
            identity,
            audit,
            Arc::new(events.clone()),
            clock,
            config.dispatcher_config(),
        ));

        let client: Arc<dyn PortalActionsApi> =
            Arc::new(PortalLocalClient::new(dispatcher.clone()));
        info!("portal_core initialized");

        Ok(Self {
            config,
            dispatcher,
            events,
            client,
        })
    }

    pub fn config(&self) -> &PortalCoreConfig {
        &self.config
    }

    /// In-process client for other modules.
    pub fn client(&self) -> Arc<dyn PortalActionsApi> {
        self.client.clone()
    }

    pub fn dispatcher(&self) -> Arc<ActionDispatcher> {
        self.dispatcher.clone()
    }

    /// Domain events published after this call.
    pub fn events(&self) -> impl Stream<Item = PortalDomainEvent> {
        self.events.subscribe()
    }

    pub async fn open_dashboard(&self) -> Dashboard {
        Dashboard::open(self.dispatcher.clone(), self.config.view_grace).await
    }
}
