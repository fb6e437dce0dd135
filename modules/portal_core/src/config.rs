use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::contract::model::Role;
use crate::domain::service::DispatcherConfig;

/// Configuration for the portal_core module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortalCoreConfig {
    /// Role the dashboard acts as; also picks the audit log type.
    #[serde(default = "default_role")]
    pub role: Role,
    /// How long a view stays connected after its last consumer leaves.
    #[serde(default = "default_view_grace", with = "humantime_serde")]
    pub view_grace: Duration,
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for PortalCoreConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            view_grace: default_view_grace(),
            max_message_length: default_max_message_length(),
            max_content_length: default_max_content_length(),
            max_title_length: default_max_title_length(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl PortalCoreConfig {
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            role: self.role,
            max_message_length: self.max_message_length,
            max_content_length: self.max_content_length,
            max_title_length: self.max_title_length,
        }
    }
}

fn default_role() -> Role {
    Role::Tutor
}

fn default_view_grace() -> Duration {
    live_state::DEFAULT_RELEASE_GRACE
}

fn default_max_message_length() -> usize {
    2000
}

fn default_max_content_length() -> usize {
    20_000
}

fn default_max_title_length() -> usize {
    200
}

fn default_event_buffer() -> usize {
    64
}
