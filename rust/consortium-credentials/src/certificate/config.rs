//! Trust material of a certificate provider.

use consortium_common::Fingerprint;
use consortium_msp::{MspConfig, MspError, MspVersion, ProviderType};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use super::Certificate;

/// A revoked certificate, named by its issuer and serial number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevokedCertificate {
    /// Fingerprint of the issuing CA certificate.
    pub issuer: Fingerprint,
    /// Serial number of the revoked certificate.
    pub serial: u64,
}

/// An organizational unit identities are allowed to belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationalUnitIdentifier {
    /// Fingerprint of the CA certificate that attests the unit.
    pub certifier: Fingerprint,
    /// Name of the unit.
    pub unit: String,
}

/// The node's own enrollment: a certificate and its Ed25519 seed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningIdentityConfig {
    /// Certificate of the signer.
    pub certificate: Certificate,
    /// Ed25519 seed of the key the certificate was issued for.
    #[serde(with = "serde_bytes")]
    pub private_key: Vec<u8>,
}

impl std::fmt::Debug for SigningIdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentityConfig")
            .field("certificate", &self.certificate.body.subject)
            .finish_non_exhaustive()
    }
}

/// Configuration payload of a certificate provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateMspConfig {
    /// Organization identifier.
    pub name: String,
    /// Self-signed root CA certificates.
    pub root_certs: Vec<Certificate>,
    /// Intermediate CA certificates, in any order.
    #[serde(default)]
    pub intermediate_certs: Vec<Certificate>,
    /// Certificates whose holders act as organization administrators.
    #[serde(default)]
    pub admins: Vec<Certificate>,
    /// Revoked certificates.
    #[serde(default)]
    pub revocation_list: Vec<RevokedCertificate>,
    /// When non-empty, identities must belong to one of these units.
    #[serde(default)]
    pub organizational_unit_identifiers: Vec<OrganizationalUnitIdentifier>,
    /// The node's signing identity, if it enrolled with this organization.
    #[serde(default)]
    pub signing_identity: Option<SigningIdentityConfig>,
    /// TLS root certificates, passed through verbatim.
    #[serde(default)]
    pub tls_root_certs: Vec<ByteBuf>,
    /// TLS intermediate certificates, passed through verbatim.
    #[serde(default)]
    pub tls_intermediate_certs: Vec<ByteBuf>,
}

impl CertificateMspConfig {
    /// A configuration trusting the given roots and nothing else.
    pub fn new(name: impl Into<String>, root_certs: Vec<Certificate>) -> Self {
        Self {
            name: name.into(),
            root_certs,
            intermediate_certs: vec![],
            admins: vec![],
            revocation_list: vec![],
            organizational_unit_identifiers: vec![],
            signing_identity: None,
            tls_root_certs: vec![],
            tls_intermediate_certs: vec![],
        }
    }

    /// Decode the scheme payload of an [`MspConfig`].
    pub fn decode(bytes: &[u8]) -> Result<Self, MspError> {
        serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|error| MspError::MalformedConfig(error.to_string()))
    }

    /// Encode as a scheme payload.
    pub fn encode(&self) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|error| MspError::MalformedConfig(error.to_string()))
    }

    /// Wrap into a provider configuration.
    pub fn to_msp_config(&self, version: MspVersion) -> Result<MspConfig, MspError> {
        Ok(MspConfig::new(ProviderType::Certificate, self.encode()?).with_version(version))
    }
}
