use std::any::Any;
use std::sync::Arc;

use consortium_common::time::SystemTime;
use consortium_msp::{
    Identity, IdentityIdentifier, MspError, OrganizationalUnit, ProviderHandle, SigningIdentity,
};
use p256::ecdsa::{
    DerSignature, SigningKey, VerifyingKey,
    signature::{Signer as _, Verifier as _},
};

use super::Credential;

/// An identity backed by an anonymous credential.
///
/// The identifier is the fingerprint of the pseudonym key; the holder's name
/// is never part of the credential.
#[derive(Debug, Clone)]
pub struct AnonymousIdentity {
    pub(super) identifier: IdentityIdentifier,
    pub(super) credential: Credential,
    pub(super) nym_key: VerifyingKey,
    pub(super) units: Vec<OrganizationalUnit>,
    pub(super) serialized: Vec<u8>,
    pub(super) issuer: ProviderHandle,
}

impl AnonymousIdentity {
    /// The credential this identity was decoded from.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

impl Identity for AnonymousIdentity {
    fn identifier(&self) -> &IdentityIdentifier {
        &self.identifier
    }

    fn organizational_units(&self) -> &[OrganizationalUnit] {
        &self.units
    }

    fn expires_at(&self) -> Option<SystemTime> {
        self.credential.expires_at()
    }

    fn anonymous(&self) -> bool {
        true
    }

    fn issuer(&self) -> &ProviderHandle {
        &self.issuer
    }

    fn serialize(&self) -> Vec<u8> {
        self.serialized.clone()
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MspError> {
        let signature = DerSignature::from_bytes(signature)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))?;
        self.nym_key
            .verify(message, &signature)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The node's anonymous identity together with its pseudonym secret.
#[derive(Debug)]
pub struct AnonymousSigningIdentity {
    identity: Arc<AnonymousIdentity>,
    key: SigningKey,
}

impl AnonymousSigningIdentity {
    pub(super) fn new(identity: AnonymousIdentity, key: SigningKey) -> Self {
        Self {
            identity: Arc::new(identity),
            key,
        }
    }
}

impl Identity for AnonymousSigningIdentity {
    fn identifier(&self) -> &IdentityIdentifier {
        self.identity.identifier()
    }

    fn organizational_units(&self) -> &[OrganizationalUnit] {
        self.identity.organizational_units()
    }

    fn expires_at(&self) -> Option<SystemTime> {
        self.identity.expires_at()
    }

    fn anonymous(&self) -> bool {
        true
    }

    fn issuer(&self) -> &ProviderHandle {
        self.identity.issuer()
    }

    fn serialize(&self) -> Vec<u8> {
        self.identity.serialize()
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MspError> {
        self.identity.verify(message, signature)
    }

    fn as_any(&self) -> &dyn Any {
        self.identity.as_ref()
    }
}

impl SigningIdentity for AnonymousSigningIdentity {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, MspError> {
        let signature: DerSignature = self
            .key
            .try_sign(message)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))?;
        Ok(signature.as_bytes().to_vec())
    }

    fn public_version(&self) -> Arc<dyn Identity> {
        self.identity.clone()
    }
}
