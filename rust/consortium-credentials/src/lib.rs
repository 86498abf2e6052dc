//! Concrete membership service providers.
//!
//! Two schemes are supported, each behind the [`Msp`](consortium_msp::Msp)
//! contract:
//!
//! - [`CertificateMsp`]: Ed25519 certificate chains rooted in the
//!   organization's CAs.
//! - [`AnonymousMsp`]: P-256 issuer-attested anonymous credentials.
//!
//! [`CredentialProvider::setup`] picks the scheme named by an
//! [`MspConfig`](consortium_msp::MspConfig), and [`CachedMsp`] can wrap any
//! provider to skip repeated decoding and validation work.
//!
//! Enable the `helpers` feature to mint fixture certificates and credentials.

#![warn(missing_docs)]

pub mod certificate;
pub use certificate::*;

pub mod anonymous;
pub use anonymous::*;

mod provider;
pub use provider::*;

mod cache;
pub use cache::*;

#[cfg(any(test, feature = "helpers"))]
pub mod helpers;
