//! Access control on top of membership managers.
//!
//! An [`AclProvider`] maps a protected resource name, optionally within a
//! channel, to a [`Principal`](consortium_msp::Principal) and evaluates a
//! signed request against it: the signer is resolved by the channel's (or
//! the node's local) membership manager, validated, its signature checked
//! and the principal evaluated by the issuing provider. Every failure is
//! reported as [`AclError::AccessDenied`]; the cause is only logged.
//!
//! The [`SecurityAdvisor`] answers a simpler question for gossip: which
//! organization does a raw peer identity belong to?

#![warn(missing_docs)]

mod error;
pub use error::*;

mod envelope;
pub use envelope::*;

pub mod resources;
pub use resources::{AclTable, PolicyRef};

mod config;
pub use config::*;

mod checker;
pub use checker::*;

mod advisor;
pub use advisor::*;
