//! The process-wide table of membership managers.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use consortium_common::Snapshot;
use serde::{Deserialize, Serialize};

use crate::{MspError, MspManager};

/// Identifier of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Create a channel identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChannelId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ChannelId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Maps channels to their membership managers, next to the node's local
/// manager.
///
/// The registry is created at bootstrap and passed by reference to everything
/// that needs it. Channel managers are installed and removed by the
/// channel configuration path; lookups always observe either the table
/// before or after such a change.
#[derive(Debug)]
pub struct ManagerRegistry {
    local: Arc<dyn MspManager>,
    channels: Snapshot<HashMap<ChannelId, Arc<dyn MspManager>>>,
}

impl ManagerRegistry {
    /// Create a registry around the node's local manager.
    pub fn new(local: Arc<dyn MspManager>) -> Self {
        Self {
            local,
            channels: Snapshot::default(),
        }
    }

    /// The node's local manager.
    pub fn local(&self) -> Arc<dyn MspManager> {
        self.local.clone()
    }

    /// The manager installed for `channel`.
    pub fn for_channel(&self, channel: &ChannelId) -> Result<Arc<dyn MspManager>, MspError> {
        self.channels
            .load()
            .get(channel)
            .cloned()
            .ok_or_else(|| MspError::UnknownChannel(channel.clone()))
    }

    /// The manager for `channel`, or the local one when no channel is given.
    pub fn deserializer(
        &self,
        channel: Option<&ChannelId>,
    ) -> Result<Arc<dyn MspManager>, MspError> {
        match channel {
            Some(channel) => self.for_channel(channel),
            None => Ok(self.local()),
        }
    }

    /// Install (or replace) the manager for `channel`, returning the one it
    /// replaced.
    pub fn install(
        &self,
        channel: ChannelId,
        manager: Arc<dyn MspManager>,
    ) -> Option<Arc<dyn MspManager>> {
        tracing::info!(%channel, "Installing channel membership manager");
        self.channels
            .update(|channels| channels.insert(channel, manager))
    }

    /// Remove the manager for `channel`, returning it if there was one.
    pub fn remove(&self, channel: &ChannelId) -> Option<Arc<dyn MspManager>> {
        tracing::info!(%channel, "Removing channel membership manager");
        self.channels.update(|channels| channels.remove(channel))
    }

    /// Channels that currently have a manager, in no particular order.
    pub fn channels(&self) -> Vec<ChannelId> {
        self.channels.load().keys().cloned().collect()
    }

    /// Every installed channel manager, in no particular order.
    pub fn channel_managers(&self) -> Vec<(ChannelId, Arc<dyn MspManager>)> {
        self.channels
            .load()
            .iter()
            .map(|(channel, manager)| (channel.clone(), manager.clone()))
            .collect()
    }
}
