//! The credential provider contract.
//!
//! One [`Msp`] instance binds one organization's trust material and one
//! credential scheme. Managers and the access-control layer only ever talk to
//! providers through this trait, so they never branch on the scheme.

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{
    Identity, MspError, Principal, PrincipalKind, ProviderHandle, SerializedIdentity,
    SigningIdentity, matcher,
};

/// Credential scheme discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Certificate chains rooted in organization CAs.
    Certificate,
    /// Issuer-attested anonymous credentials.
    Anonymous,
}

impl Display for ProviderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Certificate => f.write_str("certificate"),
            ProviderType::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// Behavioral version of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum MspVersion {
    /// Evaluates every principal kind except `Anonymity`. Combinations are
    /// still walked, so an `Anonymity` leaf inside one never matches.
    #[serde(rename = "1.0")]
    V1_0,
    /// Adds `Anonymity` principals.
    #[default]
    #[serde(rename = "1.3")]
    V1_3,
}

impl MspVersion {
    /// Whether principals of the given kind can be evaluated at this version.
    pub fn supports(&self, kind: PrincipalKind) -> bool {
        match kind {
            PrincipalKind::Anonymity => *self >= MspVersion::V1_3,
            _ => true,
        }
    }
}

/// Who decides whether an identity satisfies a principal of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Evaluation {
    /// The generic [`matcher::matches`] decides from the identity's public
    /// attributes.
    Generic,
    /// The provider decides via [`Msp::satisfies_scheme_principal`], because
    /// the decision needs scheme-internal checks.
    Scheme,
}

/// Configuration handed to a provider's setup.
///
/// The scheme payload is opaque here; the scheme named by `provider_type`
/// decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MspConfig {
    /// Scheme the payload is meant for.
    pub provider_type: ProviderType,
    /// Behavioral version of the provider to build.
    #[serde(default)]
    pub version: MspVersion,
    /// Scheme-specific, serialized trust material.
    #[serde(with = "serde_bytes")]
    pub config: Vec<u8>,
}

impl MspConfig {
    /// Bundle a scheme payload.
    pub fn new(provider_type: ProviderType, config: Vec<u8>) -> Self {
        Self {
            provider_type,
            version: MspVersion::default(),
            config,
        }
    }

    /// Override the provider version.
    pub fn with_version(mut self, version: MspVersion) -> Self {
        self.version = version;
        self
    }
}

/// A membership service provider: one organization's credential authority.
pub trait Msp: Debug + Send + Sync {
    /// Scheme of this provider.
    fn provider_type(&self) -> ProviderType;

    /// Behavioral version of this provider.
    fn version(&self) -> MspVersion;

    /// Handle naming this provider instance.
    fn handle(&self) -> &ProviderHandle;

    /// Identifier of the organization this provider speaks for.
    fn identifier(&self) -> &str {
        self.handle().msp()
    }

    /// TLS root certificates of the organization, verbatim.
    fn tls_root_certs(&self) -> &[Vec<u8>] {
        &[]
    }

    /// TLS intermediate certificates of the organization, verbatim.
    fn tls_intermediate_certs(&self) -> &[Vec<u8>] {
        &[]
    }

    /// Parse a serialized identity into an identity bound to this provider.
    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError>;

    /// Structural check of a decoded envelope; does not walk trust chains.
    fn is_well_formed(&self, identity: &SerializedIdentity) -> Result<(), MspError>;

    /// Full trust evaluation of an identity created by this provider.
    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError>;

    /// Instant after which a successful [`Msp::validate`] of `identity` stops
    /// holding, accounting for every credential on its trust path.
    fn valid_until(&self, identity: &dyn Identity) -> Option<SystemTime> {
        identity.expires_at()
    }

    /// Declares who evaluates leaf principals of the given kind.
    fn evaluation(&self, _kind: PrincipalKind) -> Evaluation {
        Evaluation::Generic
    }

    /// Scheme-specific evaluation of a leaf principal, called for every kind
    /// this provider declared as [`Evaluation::Scheme`].
    fn satisfies_scheme_principal(
        &self,
        _identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        Err(MspError::mismatch(format!(
            "{} provider has no scheme evaluation for {:?} principals",
            self.provider_type(),
            principal.kind()
        )))
    }

    /// Decide whether `identity` satisfies `principal`.
    ///
    /// The identity must have been created by this provider and must
    /// validate; the principal is then evaluated by [`matcher::satisfy`].
    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        self.ensure_issued(identity)?;
        self.validate(identity)?;
        matcher::satisfy(self, identity, principal)
    }

    /// The node's own signing identity for this organization.
    fn default_signing_identity(&self) -> Result<Arc<dyn SigningIdentity>, MspError>;

    /// Fails closed unless `identity` was created by this provider instance.
    fn ensure_issued(&self, identity: &dyn Identity) -> Result<(), MspError> {
        if identity.issuer() == self.handle() {
            Ok(())
        } else {
            Err(MspError::unknown_issuer(identity.msp_identifier()))
        }
    }
}
