//! Issuer-attested attribute credentials.

use consortium_common::{Fingerprint, time};
use consortium_msp::{MspError, MspRole};
use p256::ecdsa::{DerSignature, VerifyingKey, signature::Verifier as _};
use serde::{Deserialize, Serialize};

/// Attributes an issuer attests for one credential holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialAttributes {
    /// Organization the holder belongs to.
    pub msp: String,
    /// Organizational unit of the holder.
    pub organizational_unit: String,
    /// Role of the holder within the organization.
    pub role: MspRole,
    /// Handle the issuer revokes the credential by.
    pub revocation_handle: u64,
    /// Compressed SEC1 P-256 key the holder signs with.
    #[serde(with = "serde_bytes")]
    pub nym_key: Vec<u8>,
    /// Expiry as seconds since the unix epoch.
    #[serde(default)]
    pub not_after: Option<u64>,
}

/// A credential: attributes plus the issuer's attestation over them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Attested attributes.
    pub attributes: CredentialAttributes,
    /// DER encoded ECDSA signature of the issuer over the DAG-CBOR encoded
    /// attributes.
    #[serde(with = "serde_bytes")]
    pub attestation: Vec<u8>,
}

impl Credential {
    /// Decode a DAG-CBOR encoded credential.
    pub fn decode(bytes: &[u8]) -> Result<Self, MspError> {
        let credential: Self = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))?;
        credential.nym_key()?;
        Ok(credential)
    }

    /// Encode as DAG-CBOR.
    pub fn encode(&self) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(self)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))
    }

    /// Bytes covered by the issuer's attestation.
    pub fn attested_bytes(attributes: &CredentialAttributes) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(attributes)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))
    }

    /// The holder's pseudonym key.
    pub fn nym_key(&self) -> Result<VerifyingKey, MspError> {
        VerifyingKey::from_sec1_bytes(&self.attributes.nym_key)
            .map_err(|error| MspError::MalformedIdentity(format!("invalid pseudonym key: {error}")))
    }

    /// Fingerprint of the pseudonym key; the only stable handle on the
    /// holder.
    pub fn nym_fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.attributes.nym_key)
    }

    /// Check the issuer's attestation.
    pub fn verify_attestation(&self, issuer: &VerifyingKey) -> Result<(), MspError> {
        let signature = DerSignature::from_bytes(&self.attestation)
            .map_err(|error| MspError::Untrusted(format!("malformed attestation: {error}")))?;
        issuer
            .verify(&Self::attested_bytes(&self.attributes)?, &signature)
            .map_err(|_| MspError::Untrusted("attestation does not verify".into()))
    }

    /// The expiry instant, if any.
    pub fn expires_at(&self) -> Option<time::SystemTime> {
        self.attributes.not_after.map(time::from_unix_seconds)
    }
}
