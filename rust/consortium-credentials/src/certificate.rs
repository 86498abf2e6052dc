//! Certificate scheme.
//!
//! Organizations run a hierarchy of Ed25519 certificate authorities. A member
//! identity is a leaf certificate issued, directly or through intermediates,
//! by one of the organization's roots. Organizational units are attested in
//! the certificate and certified by the issuing CA's fingerprint; holders of
//! the `admin` unit, or of a certificate listed among the configured admins,
//! act as the organization's administrators.

mod body;
mod config;
mod identity;
mod msp;

pub use body::{Certificate, CertificateBody, PUBLIC_KEY_SIZE};
pub use config::{
    CertificateMspConfig, OrganizationalUnitIdentifier, RevokedCertificate, SigningIdentityConfig,
};
pub use identity::{CertificateIdentity, CertificateSigningIdentity};
pub use msp::CertificateMsp;
