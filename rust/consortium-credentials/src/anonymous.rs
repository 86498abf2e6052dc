//! Anonymous-credential scheme.
//!
//! An organization's issuer attests a small attribute set (organization,
//! organizational unit, role, revocation handle and an optional expiry) for a
//! pseudonym key chosen by the holder. Holders sign with the pseudonym key;
//! verifiers learn the attested attributes and nothing about who the holder
//! is.

mod config;
mod credential;
mod identity;
mod msp;

pub use config::{AnonymousMspConfig, AnonymousSignerConfig};
pub use credential::{Credential, CredentialAttributes};
pub use identity::{AnonymousIdentity, AnonymousSigningIdentity};
pub use msp::AnonymousMsp;
