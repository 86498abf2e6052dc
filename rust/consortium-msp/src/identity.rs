//! Identity and signing identity traits.
//!
//! Identities are produced by a single [`Msp`](crate::Msp) and are only ever
//! interpreted by that provider. Everything outside of it sees the
//! scheme-agnostic view exposed here.

use std::any::Any;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use consortium_common::Fingerprint;
use serde::{Deserialize, Serialize};

use crate::MspError;

/// The (organization, local identifier) pair naming an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityIdentifier {
    /// Identifier of the issuing organization.
    pub msp: String,
    /// Identifier of the identity within that organization.
    pub id: String,
}

impl Display for IdentityIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.msp, self.id)
    }
}

/// Membership of an identity in an organizational unit, as attested by a
/// certifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationalUnit {
    /// Fingerprint of the trust material that attests the membership.
    pub certifier: Fingerprint,
    /// Name of the unit.
    pub unit: String,
}

impl OrganizationalUnit {
    /// Create a new organizational unit entry.
    pub fn new(certifier: Fingerprint, unit: impl Into<String>) -> Self {
        Self {
            certifier,
            unit: unit.into(),
        }
    }
}

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Names one live provider instance.
///
/// Identities keep the handle of the provider that created them. Two
/// providers for the same organization (for example before and after a
/// reconfiguration) have different handles, so an identity is never
/// interpreted by a provider other than its creator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderHandle {
    msp: String,
    instance: u64,
}

impl ProviderHandle {
    /// Allocate a fresh handle for a provider of the given organization.
    pub fn new(msp: impl Into<String>) -> Self {
        Self {
            msp: msp.into(),
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Organization identifier of the provider.
    pub fn msp(&self) -> &str {
        &self.msp
    }

    /// Process-unique instance number.
    pub fn instance(&self) -> u64 {
        self.instance
    }
}

/// A verified, in-memory representation of one external principal's
/// credential.
pub trait Identity: Debug + Send + Sync + 'static {
    /// The identity's (organization, local identifier) pair.
    fn identifier(&self) -> &IdentityIdentifier;

    /// Identifier of the organization that issued this identity.
    fn msp_identifier(&self) -> &str {
        &self.identifier().msp
    }

    /// Organizational units this identity belongs to.
    fn organizational_units(&self) -> &[OrganizationalUnit];

    /// Instant after which the identity is no longer valid, `None` if it
    /// never expires.
    fn expires_at(&self) -> Option<SystemTime>;

    /// Whether the identity is backed by an anonymous credential.
    fn anonymous(&self) -> bool;

    /// Handle of the provider that created this identity.
    fn issuer(&self) -> &ProviderHandle;

    /// Canonical serialized form (the envelope this identity was decoded
    /// from).
    fn serialize(&self) -> Vec<u8>;

    /// Verify `signature` over `message` with this identity's public key.
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MspError>;

    /// Escape hatch used by the creating provider to recover its own
    /// concrete identity type.
    fn as_any(&self) -> &dyn Any;
}

/// An [`Identity`] that can also sign, i.e. the node's own enrolled identity.
pub trait SigningIdentity: Identity {
    /// Sign the given message.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, MspError>;

    /// The plain identity remote verifiers will see.
    fn public_version(&self) -> Arc<dyn Identity>;
}
