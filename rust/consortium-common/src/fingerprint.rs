use std::array::TryFromSliceError;
use std::fmt::{Debug, Display, Formatter};

use base58::ToBase58;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

/// The size of a fingerprint in bytes.
pub const FINGERPRINT_SIZE: usize = 32;

/// A SHA-256 digest identifying a piece of trust material.
///
/// Fingerprints name certificate authorities and credential issuers (for
/// example as the certifier of an organizational unit) without exposing the
/// encoding of the material they were computed over.
///
/// ```rust
/// use consortium_common::Fingerprint;
///
/// let fingerprint = Fingerprint::of(b"root certificate");
/// assert_eq!(fingerprint, Fingerprint::of(b"root certificate"));
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// Computes the fingerprint of the given bytes.
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Raw digest bytes.
    pub fn bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }
}

impl From<[u8; FINGERPRINT_SIZE]> for Fingerprint {
    fn from(value: [u8; FINGERPRINT_SIZE]) -> Self {
        Fingerprint(value)
    }
}

impl TryFrom<&[u8]> for Fingerprint {
    type Error = TryFromSliceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(Fingerprint(value.try_into()?))
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_base58())
    }
}

impl Debug for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Fingerprint").field(&self.to_string()).finish()
    }
}

impl Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: serde_bytes::ByteBuf = Deserialize::deserialize(deserializer)?;
        Fingerprint::try_from(bytes.as_slice()).map_err(|_| {
            serde::de::Error::custom(format!(
                "expected {FINGERPRINT_SIZE} fingerprint bytes, found {}",
                bytes.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testresult::TestResult;

    #[test]
    fn it_distinguishes_different_material() {
        assert_ne!(Fingerprint::of(b"one"), Fingerprint::of(b"two"));
    }

    #[test]
    fn it_rejects_short_slices() {
        assert!(Fingerprint::try_from(&[0u8; 12][..]).is_err());
    }

    #[test]
    fn it_survives_serde() -> TestResult {
        let fingerprint = Fingerprint::of(b"issuer");
        let json = serde_json::to_string(&fingerprint)?;
        let decoded: Fingerprint = serde_json::from_str(&json)?;
        assert_eq!(decoded, fingerprint);
        Ok(())
    }
}
