//! Channel configuration, as seen by access checks.

use std::collections::HashMap;
use std::fmt::Debug;

use consortium_common::Snapshot;
use consortium_msp::{ChannelId, Principal};

use crate::{AclTable, PolicyRef};

/// Per-channel access-control configuration.
///
/// Implemented by whatever tracks channel configuration updates. Channels
/// only carry overrides: a resource without a channel entry falls back to
/// the checker's defaults.
pub trait ChannelConfig: Debug + Send + Sync {
    /// The channel's own policy for `resource`, if it overrides one.
    fn resource_policy(&self, channel: &ChannelId, resource: &str) -> Option<PolicyRef>;

    /// Resolve the named policy `name` in the context of `channel` to a
    /// principal.
    fn resolve_policy(&self, channel: &ChannelId, name: &str) -> Option<Principal>;
}

/// A [`ChannelConfig`] holding one [`AclTable`] per channel in memory.
///
/// Tables are replaced whole; readers see either the previous or the new
/// table of a channel.
#[derive(Debug, Default)]
pub struct StaticChannelConfig {
    channels: Snapshot<HashMap<ChannelId, AclTable>>,
}

impl StaticChannelConfig {
    /// A configuration without channels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the table of `channel`.
    pub fn update_channel(&self, channel: ChannelId, table: AclTable) {
        tracing::info!(%channel, resources = table.acls.len(), "Updating channel ACLs");
        self.channels.update(|channels| {
            channels.insert(channel, table);
        });
    }

    /// Forget `channel`.
    pub fn remove_channel(&self, channel: &ChannelId) {
        self.channels.update(|channels| {
            channels.remove(channel);
        });
    }
}

impl ChannelConfig for StaticChannelConfig {
    fn resource_policy(&self, channel: &ChannelId, resource: &str) -> Option<PolicyRef> {
        self.channels.load().get(channel)?.resource(resource).cloned()
    }

    fn resolve_policy(&self, channel: &ChannelId, name: &str) -> Option<Principal> {
        self.channels
            .load()
            .get(channel)?
            .resolve(&PolicyRef::Alias(name.to_string()))
    }
}
