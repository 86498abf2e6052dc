use std::any::Any;
use std::sync::Arc;

use consortium_common::{Fingerprint, time::SystemTime};
use consortium_msp::{
    Identity, IdentityIdentifier, MspError, OrganizationalUnit, ProviderHandle, SigningIdentity,
};
use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use signature::{Signer, Verifier};

use super::Certificate;

/// An identity backed by a certificate.
#[derive(Debug, Clone)]
pub struct CertificateIdentity {
    pub(super) identifier: IdentityIdentifier,
    pub(super) certificate: Certificate,
    pub(super) fingerprint: Fingerprint,
    pub(super) key: VerifyingKey,
    pub(super) units: Vec<OrganizationalUnit>,
    pub(super) serialized: Vec<u8>,
    pub(super) issuer: ProviderHandle,
}

impl CertificateIdentity {
    /// The certificate this identity was decoded from.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Fingerprint of the certificate.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

impl Identity for CertificateIdentity {
    fn identifier(&self) -> &IdentityIdentifier {
        &self.identifier
    }

    fn organizational_units(&self) -> &[OrganizationalUnit] {
        &self.units
    }

    fn expires_at(&self) -> Option<SystemTime> {
        self.certificate.expires_at()
    }

    fn anonymous(&self) -> bool {
        false
    }

    fn issuer(&self) -> &ProviderHandle {
        &self.issuer
    }

    fn serialize(&self) -> Vec<u8> {
        self.serialized.clone()
    }

    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MspError> {
        let signature = Signature::from_slice(signature)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))?;
        self.key
            .verify(message, &signature)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A certificate identity together with the key it was issued for.
#[derive(Debug)]
pub struct CertificateSigningIdentity {
    identity: Arc<CertificateIdentity>,
    key: SigningKey,
}

impl CertificateSigningIdentity {
    pub(super) fn new(identity: CertificateIdentity, key: SigningKey) -> Self {
        Self {
            identity: Arc::new(identity),
            key,
        }
    }
}

impl Identity for CertificateSigningIdentity {
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
        false
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

impl SigningIdentity for CertificateSigningIdentity {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, MspError> {
        let signature: Signature = self
            .key
            .try_sign(message)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))?;
        Ok(signature.to_bytes().to_vec())
    }

    fn public_version(&self) -> Arc<dyn Identity> {
        self.identity.clone()
    }
}
