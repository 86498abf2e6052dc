//! Resource access checks.

use std::fmt::Debug;
use std::sync::Arc;

use consortium_msp::{ChannelId, ManagerRegistry, MspError, MspManager, Principal};

use crate::{AclError, AclTable, ChannelConfig, PolicyRef, RequestEnvelope};

/// Decides whether a signed request may access a named resource.
pub trait AclProvider: Debug + Send + Sync {
    /// Check `envelope` against the policy of `resource` on `channel`.
    fn check_acl(
        &self,
        resource: &str,
        channel: &ChannelId,
        envelope: &dyn RequestEnvelope,
    ) -> Result<(), AclError>;

    /// Check `envelope` against the node-local policy of `resource`.
    ///
    /// Never consults channel configuration.
    fn check_acl_no_channel(
        &self,
        resource: &str,
        envelope: &dyn RequestEnvelope,
    ) -> Result<(), AclError>;
}

/// [`AclProvider`] evaluating resource policies against the membership
/// managers of a [`ManagerRegistry`].
///
/// Channel checks take the channel's override for a resource when there is
/// one and the default table otherwise. Channel-less checks only use the
/// local table and the local manager.
#[derive(Debug)]
pub struct ResourceAclProvider {
    registry: Arc<ManagerRegistry>,
    channels: Arc<dyn ChannelConfig>,
    defaults: AclTable,
    local: AclTable,
}

impl ResourceAclProvider {
    /// Create a checker.
    pub fn new(
        registry: Arc<ManagerRegistry>,
        channels: Arc<dyn ChannelConfig>,
        defaults: AclTable,
        local: AclTable,
    ) -> Self {
        Self {
            registry,
            channels,
            defaults,
            local,
        }
    }

    fn channel_principal(&self, resource: &str, channel: &ChannelId) -> Result<Principal, MspError> {
        let policy = self
            .channels
            .resource_policy(channel, resource)
            .or_else(|| self.defaults.resource(resource).cloned())
            .ok_or_else(|| unknown_resource(resource))?;

        match policy {
            PolicyRef::Principal(principal) => Ok(principal),
            PolicyRef::Alias(name) => self
                .channels
                .resolve_policy(channel, &name)
                .or_else(|| self.defaults.resolve(&PolicyRef::Alias(name.clone())))
                .ok_or_else(|| {
                    MspError::NotConfigured(format!(
                        "policy '{name}' does not resolve on channel '{channel}'"
                    ))
                }),
        }
    }

    fn local_principal(&self, resource: &str) -> Result<Principal, MspError> {
        let policy = self
            .local
            .resource(resource)
            .ok_or_else(|| unknown_resource(resource))?;
        self.local.resolve(policy).ok_or_else(|| {
            MspError::NotConfigured(format!("local policy of '{resource}' does not resolve"))
        })
    }
}

fn unknown_resource(resource: &str) -> MspError {
    MspError::NotConfigured(format!("no policy for resource '{resource}'"))
}

/// Evaluate `envelope` against `principal` with the identities of
/// `manager`.
///
/// The issuing provider validates the signer as part of principal
/// evaluation.
fn evaluate(
    manager: &dyn MspManager,
    principal: &Principal,
    envelope: &dyn RequestEnvelope,
) -> Result<(), MspError> {
    let signed = envelope.signed_data()?;
    let identity = manager.resolve_identity(&signed.signer)?;

    identity.verify(&signed.message, &signed.signature)?;
    identity.satisfies_principal(principal)
}

/// Collapse an evaluation outcome to the externally visible result.
fn decide(
    resource: &str,
    channel: Option<&ChannelId>,
    outcome: Result<(), MspError>,
) -> Result<(), AclError> {
    match outcome {
        Ok(()) => {
            tracing::debug!(resource, ?channel, "Access granted");
            Ok(())
        }
        Err(cause) => {
            tracing::warn!(resource, ?channel, %cause, "Access denied");
            Err(AclError::AccessDenied)
        }
    }
}

impl AclProvider for ResourceAclProvider {
    fn check_acl(
        &self,
        resource: &str,
        channel: &ChannelId,
        envelope: &dyn RequestEnvelope,
    ) -> Result<(), AclError> {
        let outcome = self.channel_principal(resource, channel).and_then(|principal| {
            let manager = self.registry.for_channel(channel)?;
            evaluate(manager.as_ref(), &principal, envelope)
        });

        decide(resource, Some(channel), outcome)
    }

    fn check_acl_no_channel(
        &self,
        resource: &str,
        envelope: &dyn RequestEnvelope,
    ) -> Result<(), AclError> {
        let outcome = self.local_principal(resource).and_then(|principal| {
            evaluate(self.registry.local().as_ref(), &principal, envelope)
        });

        decide(resource, None, outcome)
    }
}
