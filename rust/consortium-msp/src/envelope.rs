//! Serialized identity envelope.

use serde::{Deserialize, Serialize};

use crate::MspError;

/// Scheme-agnostic wrapper around a serialized credential.
///
/// The organization identifier is readable without interpreting the opaque
/// credential payload. It is a lookup hint only: the trust decision belongs
/// to the provider the hint selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedIdentity {
    /// Identifier of the organization that claims to have issued the
    /// credential.
    pub msp: String,
    /// Scheme-specific credential bytes.
    #[serde(with = "serde_bytes")]
    pub id_bytes: Vec<u8>,
}

impl SerializedIdentity {
    /// Wrap credential bytes for the given organization.
    pub fn new(msp: impl Into<String>, id_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            msp: msp.into(),
            id_bytes: id_bytes.into(),
        }
    }

    /// Encode the envelope as DAG-CBOR.
    pub fn encode(&self) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(self)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))
    }

    /// Decode an envelope from DAG-CBOR.
    pub fn decode(bytes: &[u8]) -> Result<Self, MspError> {
        let envelope: Self = serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))?;

        if envelope.msp.is_empty() {
            return Err(MspError::MalformedIdentity(
                "envelope carries an empty organization identifier".into(),
            ));
        }

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_reads_the_organization_without_the_payload() -> TestResult {
        let bytes = SerializedIdentity::new("OrgA", b"opaque".to_vec()).encode()?;
        let envelope = SerializedIdentity::decode(&bytes)?;

        assert_eq!(envelope.msp, "OrgA");
        assert_eq!(envelope.id_bytes, b"opaque");
        Ok(())
    }

    #[test]
    fn it_rejects_garbage() {
        assert!(matches!(
            SerializedIdentity::decode(&[0xff, 0x00, 0x13]),
            Err(MspError::MalformedIdentity(_))
        ));
    }

    #[test]
    fn it_rejects_an_empty_organization() -> TestResult {
        let bytes = SerializedIdentity::new("", b"opaque".to_vec()).encode()?;
        assert!(matches!(
            SerializedIdentity::decode(&bytes),
            Err(MspError::MalformedIdentity(_))
        ));
        Ok(())
    }
}
