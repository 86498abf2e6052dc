use crate::ChannelId;

/// Errors produced by membership service providers and the managers that
/// route to them.
///
/// Each variant is a distinguishable outcome so that callers inside the trust
/// boundary can log and test precise failure causes. Callers outside of it
/// should only ever see the collapsed form produced by the access-control
/// layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MspError {
    /// Provider configuration could not be decoded or is inconsistent.
    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    /// A configured trust anchor is structurally unacceptable.
    #[error("Untrusted root: {0}")]
    UntrustedRoot(String),

    /// A serialized identity could not be decoded.
    #[error("Malformed identity: {0}")]
    MalformedIdentity(String),

    /// No installed provider issues identities for the given organization.
    #[error("Unknown issuer '{msp}'")]
    UnknownIssuer {
        /// The organization identifier the identity claims.
        msp: String,
    },

    /// No manager has been installed for the channel.
    #[error("Unknown channel '{0}'")]
    UnknownChannel(ChannelId),

    /// The identity does not chain to the provider's trust material.
    #[error("Untrusted identity: {0}")]
    Untrusted(String),

    /// The identity's credential is past its expiry.
    #[error("Identity '{id}' expired")]
    Expired {
        /// Local identifier of the expired identity.
        id: String,
    },

    /// The identity's credential has been revoked.
    #[error("Identity '{id}' revoked")]
    Revoked {
        /// Local identifier of the revoked identity.
        id: String,
    },

    /// The identity does not satisfy the requested principal.
    #[error("Principal mismatch: {0}")]
    PrincipalMismatch(String),

    /// A signature did not verify against the identity's public key.
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// The requested material was never configured.
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

impl MspError {
    /// Shorthand for [`MspError::UnknownIssuer`].
    pub fn unknown_issuer(msp: impl Into<String>) -> Self {
        Self::UnknownIssuer { msp: msp.into() }
    }

    /// Shorthand for [`MspError::PrincipalMismatch`].
    pub fn mismatch(message: impl Into<String>) -> Self {
        Self::PrincipalMismatch(message.into())
    }
}
