//! Ed25519 certificates.

use consortium_common::{Fingerprint, time};
use consortium_msp::MspError;
use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use signature::Verifier;

/// Size of an Ed25519 public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// The signed portion of a [`Certificate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBody {
    /// Serial number, unique per issuer.
    pub serial: u64,
    /// Human readable subject name.
    pub subject: String,
    /// Public key of the issuing CA (equal to `public_key` for roots).
    #[serde(with = "serde_bytes")]
    pub issuer_key: Vec<u8>,
    /// Public key of the subject.
    #[serde(with = "serde_bytes")]
    pub public_key: Vec<u8>,
    /// Organizational unit names attested by the issuer.
    #[serde(default)]
    pub organizational_units: Vec<String>,
    /// Expiry as seconds since the unix epoch, `None` if it never expires.
    #[serde(default)]
    pub not_after: Option<u64>,
    /// Whether the subject may issue certificates.
    #[serde(default)]
    pub is_ca: bool,
}

impl CertificateBody {
    /// Bytes covered by the issuer's signature.
    pub fn signed_bytes(&self) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(self)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))
    }
}

/// A certificate: a [`CertificateBody`] signed by the issuer's Ed25519 key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Signed content.
    pub body: CertificateBody,
    /// Issuer signature over the DAG-CBOR encoded body.
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

impl Certificate {
    /// Decode a DAG-CBOR encoded certificate.
    pub fn decode(bytes: &[u8]) -> Result<Self, MspError> {
        let certificate: Self = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))?;

        if certificate.body.public_key.len() != PUBLIC_KEY_SIZE
            || certificate.body.issuer_key.len() != PUBLIC_KEY_SIZE
        {
            return Err(MspError::MalformedIdentity(format!(
                "certificate '{}' carries a key of the wrong size",
                certificate.body.subject
            )));
        }

        Ok(certificate)
    }

    /// Encode as DAG-CBOR.
    pub fn encode(&self) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(self)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))
    }

    /// SHA-256 fingerprint of the encoded certificate.
    pub fn fingerprint(&self) -> Result<Fingerprint, MspError> {
        Ok(Fingerprint::of(&self.encode()?))
    }

    /// The subject's verifying key.
    pub fn public_key(&self) -> Result<VerifyingKey, MspError> {
        verifying_key(&self.body.public_key)
    }

    /// Whether the certificate names its own key as the issuer key.
    pub fn is_self_issued(&self) -> bool {
        self.body.issuer_key == self.body.public_key
    }

    /// Verify the issuer signature against `issuer`.
    pub fn verify_issued_by(&self, issuer: &VerifyingKey) -> Result<(), MspError> {
        if self.body.issuer_key != issuer.as_bytes() {
            return Err(MspError::Untrusted(format!(
                "certificate '{}' names a different issuer",
                self.body.subject
            )));
        }

        let signature = Signature::from_slice(&self.signature)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))?;
        issuer
            .verify(&self.body.signed_bytes()?, &signature)
            .map_err(|error| MspError::SignatureInvalid(error.to_string()))
    }

    /// Whether the certificate has expired at `now`.
    pub fn is_expired_at(&self, now: time::SystemTime) -> bool {
        self.body
            .not_after
            .is_some_and(|not_after| time::from_unix_seconds(not_after) < now)
    }

    /// The expiry instant, if any.
    pub fn expires_at(&self) -> Option<time::SystemTime> {
        self.body.not_after.map(time::from_unix_seconds)
    }
}

pub(crate) fn verifying_key(bytes: &[u8]) -> Result<VerifyingKey, MspError> {
    let bytes: [u8; PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
        MspError::MalformedIdentity(format!("expected a {PUBLIC_KEY_SIZE} byte key"))
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|error| MspError::MalformedIdentity(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::CertificateAuthority;
    use testresult::TestResult;

    #[test]
    fn it_verifies_the_issuer_signature() -> TestResult {
        let ca = CertificateAuthority::root("ca.org1");
        let other = CertificateAuthority::root("ca.org2");
        let leaf = ca.issue("peer0", &["peer"]);

        leaf.verify_issued_by(&ca.certificate().public_key()?)?;
        assert!(leaf.verify_issued_by(&other.certificate().public_key()?).is_err());
        Ok(())
    }

    #[test]
    fn it_rejects_tampered_bodies() -> TestResult {
        let ca = CertificateAuthority::root("ca.org1");
        let mut leaf = ca.issue("peer0", &["peer"]);
        leaf.body.organizational_units.push("admin".into());

        assert!(matches!(
            leaf.verify_issued_by(&ca.certificate().public_key()?),
            Err(MspError::SignatureInvalid(_))
        ));
        Ok(())
    }

    #[test]
    fn it_rejects_keys_of_the_wrong_size() -> TestResult {
        let ca = CertificateAuthority::root("ca.org1");
        let mut leaf = ca.issue("peer0", &[]);
        leaf.body.public_key.truncate(16);

        assert!(matches!(
            Certificate::decode(&leaf.encode()?),
            Err(MspError::MalformedIdentity(_))
        ));
        Ok(())
    }

    #[test]
    fn it_reports_expiry() {
        let ca = CertificateAuthority::root("ca.org1");
        let leaf = ca.issue_expiring("peer0", &[], 1_000);

        assert!(!leaf.is_expired_at(time::from_unix_seconds(1_000)));
        assert!(leaf.is_expired_at(time::from_unix_seconds(1_001)));
        assert!(!ca.certificate().is_expired_at(time::now()));
    }
}
