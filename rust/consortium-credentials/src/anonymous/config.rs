use consortium_msp::{MspConfig, MspError, MspVersion, ProviderType};
use serde::{Deserialize, Serialize};

use super::Credential;

/// The node's own anonymous credential and pseudonym secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousSignerConfig {
    /// Credential the issuer attested for the node.
    pub credential: Credential,
    /// P-256 secret scalar matching the credential's pseudonym key.
    #[serde(with = "serde_bytes")]
    pub nym_secret: Vec<u8>,
}

impl std::fmt::Debug for AnonymousSignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnonymousSignerConfig")
            .field("credential", &self.credential.attributes)
            .finish_non_exhaustive()
    }
}

/// Configuration payload of an anonymous-credential provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousMspConfig {
    /// Organization identifier.
    pub name: String,
    /// Compressed SEC1 P-256 public key of the credential issuer.
    #[serde(with = "serde_bytes")]
    pub issuer_public_key: Vec<u8>,
    /// Revocation handles of withdrawn credentials.
    #[serde(default)]
    pub revoked_handles: Vec<u64>,
    /// The node's signer, if it holds a credential of this organization.
    #[serde(default)]
    pub signer: Option<AnonymousSignerConfig>,
}

impl AnonymousMspConfig {
    /// A configuration trusting `issuer_public_key` with nothing revoked.
    pub fn new(name: impl Into<String>, issuer_public_key: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            issuer_public_key,
            revoked_handles: vec![],
            signer: None,
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
        Ok(MspConfig::new(ProviderType::Anonymous, self.encode()?).with_version(version))
    }
}
