//! Fixture issuance for tests.
//!
//! Nothing here is meant for production use: keys are generated in memory
//! and never protected.

use std::sync::atomic::{AtomicU64, Ordering};

use consortium_msp::{MspRole, SerializedIdentity};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use signature::Signer;

use crate::{
    AnonymousMspConfig, Certificate, CertificateBody, CertificateMspConfig, Credential,
    CredentialAttributes, SigningIdentityConfig,
};

/// An in-memory Ed25519 certificate authority.
#[derive(Debug)]
pub struct CertificateAuthority {
    key: SigningKey,
    certificate: Certificate,
    next_serial: AtomicU64,
}

impl CertificateAuthority {
    /// A fresh self-signed root.
    pub fn root(subject: &str) -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let certificate = sign(
            &key,
            CertificateBody {
                serial: 1,
                subject: subject.to_string(),
                issuer_key: key.verifying_key().to_bytes().to_vec(),
                public_key: key.verifying_key().to_bytes().to_vec(),
                organizational_units: vec![],
                not_after: None,
                is_ca: true,
            },
        );

        Self::from_parts(key, certificate)
    }

    /// A fresh intermediate CA issued by this one.
    pub fn intermediate(&self, subject: &str) -> Self {
        self.issue_intermediate(subject, None)
    }

    /// A fresh intermediate CA issued by this one, expiring at `not_after`
    /// (unix seconds).
    pub fn intermediate_expiring(&self, subject: &str, not_after: u64) -> Self {
        self.issue_intermediate(subject, Some(not_after))
    }

    fn issue_intermediate(&self, subject: &str, not_after: Option<u64>) -> Self {
        let key = SigningKey::generate(&mut OsRng);
        let certificate = self.certify(&key, subject, &[], not_after, true);

        Self::from_parts(key, certificate)
    }

    fn from_parts(key: SigningKey, certificate: Certificate) -> Self {
        Self {
            key,
            certificate,
            next_serial: AtomicU64::new(100),
        }
    }

    /// The CA's own certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Issue a non-expiring leaf certificate for a fresh key.
    pub fn issue(&self, subject: &str, units: &[&str]) -> Certificate {
        self.enroll(subject, units).0
    }

    /// Issue a leaf certificate expiring at `not_after` (unix seconds).
    pub fn issue_expiring(&self, subject: &str, units: &[&str], not_after: u64) -> Certificate {
        let key = SigningKey::generate(&mut OsRng);
        self.certify(&key, subject, units, Some(not_after), false)
    }

    /// Issue a leaf certificate and hand out its key.
    pub fn enroll(&self, subject: &str, units: &[&str]) -> (Certificate, SigningKey) {
        let key = SigningKey::generate(&mut OsRng);
        let certificate = self.certify(&key, subject, units, None, false);
        (certificate, key)
    }

    /// Issue a CA flagged certificate that is not registered as an issuer.
    pub fn issue_ca(&self, subject: &str) -> Certificate {
        let key = SigningKey::generate(&mut OsRng);
        self.certify(&key, subject, &[], None, true)
    }

    /// A provider configuration trusting this CA as its only root and
    /// enrolling a signer with the given units.
    pub fn config_with_signer(&self, msp: &str, units: &[&str]) -> CertificateMspConfig {
        let (certificate, key) = self.enroll(&format!("signer.{msp}"), units);
        let mut config = CertificateMspConfig::new(msp, vec![self.certificate.clone()]);
        config.signing_identity = Some(SigningIdentityConfig {
            certificate,
            private_key: key.to_bytes().to_vec(),
        });
        config
    }

    fn certify(
        &self,
        key: &SigningKey,
        subject: &str,
        units: &[&str],
        not_after: Option<u64>,
        is_ca: bool,
    ) -> Certificate {
        sign(
            &self.key,
            CertificateBody {
                serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
                subject: subject.to_string(),
                issuer_key: self.key.verifying_key().to_bytes().to_vec(),
                public_key: key.verifying_key().to_bytes().to_vec(),
                organizational_units: units.iter().map(|unit| unit.to_string()).collect(),
                not_after,
                is_ca,
            },
        )
    }
}

fn sign(key: &SigningKey, body: CertificateBody) -> Certificate {
    let signature = key.sign(&body.signed_bytes().expect("certificate bodies encode"));
    Certificate {
        body,
        signature: signature.to_bytes().to_vec(),
    }
}

/// An in-memory anonymous credential issuer for one organization.
#[derive(Debug)]
pub struct AnonymousIssuer {
    msp: String,
    key: p256::ecdsa::SigningKey,
    public_key: p256::ecdsa::VerifyingKey,
}

impl AnonymousIssuer {
    /// A fresh issuer for `msp`.
    pub fn new(msp: &str) -> Self {
        let key = p256::ecdsa::SigningKey::random(&mut OsRng);
        Self {
            msp: msp.to_string(),
            public_key: *key.verifying_key(),
            key,
        }
    }

    /// The issuer's verifying key.
    pub fn public_key(&self) -> &p256::ecdsa::VerifyingKey {
        &self.public_key
    }

    /// A provider configuration trusting this issuer.
    pub fn config(&self) -> AnonymousMspConfig {
        AnonymousMspConfig::new(
            self.msp.as_str(),
            self.public_key.to_encoded_point(true).as_bytes().to_vec(),
        )
    }

    /// Issue a non-expiring credential for a fresh pseudonym.
    pub fn issue(
        &self,
        unit: &str,
        role: MspRole,
        revocation_handle: u64,
    ) -> (Credential, p256::ecdsa::SigningKey) {
        self.issue_with(unit, role, revocation_handle, None)
    }

    /// Issue a credential for a fresh pseudonym with an explicit expiry.
    pub fn issue_with(
        &self,
        unit: &str,
        role: MspRole,
        revocation_handle: u64,
        not_after: Option<u64>,
    ) -> (Credential, p256::ecdsa::SigningKey) {
        let nym = p256::ecdsa::SigningKey::random(&mut OsRng);
        let attributes = CredentialAttributes {
            msp: self.msp.clone(),
            organizational_unit: unit.to_string(),
            role,
            revocation_handle,
            nym_key: nym
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
            not_after,
        };

        let attestation: p256::ecdsa::DerSignature = self
            .key
            .sign(&Credential::attested_bytes(&attributes).expect("attributes encode"));
        let credential = Credential {
            attributes,
            attestation: attestation.as_bytes().to_vec(),
        };
        (credential, nym)
    }
}

/// Envelope bytes for a certificate identity of `msp`.
pub fn certificate_identity(msp: &str, certificate: &Certificate) -> Vec<u8> {
    envelope(msp, certificate.encode().expect("certificates encode"))
}

/// Envelope bytes for an anonymous identity of `msp`.
pub fn anonymous_identity(msp: &str, credential: &Credential) -> Vec<u8> {
    envelope(msp, credential.encode().expect("credentials encode"))
}

fn envelope(msp: &str, id_bytes: Vec<u8>) -> Vec<u8> {
    SerializedIdentity::new(msp, id_bytes)
        .encode()
        .expect("envelopes encode")
}
