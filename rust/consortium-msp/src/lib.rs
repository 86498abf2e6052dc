//! Membership service provider abstraction.
//!
//! This crate defines how a permissioned ledger decides which organization
//! issued a serialized credential, whether that credential is trusted, and
//! whether it satisfies an access predicate.
//!
//! # Core Concepts
//!
//! ## Providers
//!
//! An [`Msp`] binds one organization's trust material to one credential
//! scheme. It decodes [`Identity`] values from serialized credentials,
//! validates them and evaluates [`Principal`]s against them. Scheme
//! implementations live in `consortium-credentials`; nothing here depends on
//! a particular scheme.
//!
//! ## Principals
//!
//! A [`Principal`] is plain data: a role of an organization, an
//! organizational unit, one exact identity, an anonymity requirement, or an
//! all/any combination of those. [`matcher::matches`] evaluates principals
//! generically; providers declare per [`PrincipalKind`] whether that is
//! enough or whether they must evaluate the kind themselves (see
//! [`Evaluation`]).
//!
//! ## Scopes
//!
//! A [`MembershipManager`] holds the providers of one scope (the node's local
//! scope or one channel) and dispatches serialized identities by the
//! organization identifier in their [`SerializedIdentity`] envelope. The
//! [`ManagerRegistry`] maps channels to managers.
//!
//! ```text
//! serialized identity
//!   └── ManagerRegistry (local | channel)
//!         └── MembershipManager (organization id → provider)
//!               └── Msp (deserialize, validate, satisfies_principal)
//! ```

mod error;
pub use error::*;

mod identity;
pub use identity::*;

mod envelope;
pub use envelope::*;

mod principal;
pub use principal::*;

pub mod matcher;

mod provider;
pub use provider::*;

mod manager;
pub use manager::*;

mod registry;
pub use registry::*;
