//! Principals: data describing classes of acceptable identities.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use consortium_common::Fingerprint;
use serde::{Deserialize, Serialize};

/// Role an identity may hold within its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MspRole {
    /// Any member of the organization.
    Member,
    /// An administrator of the organization.
    Admin,
    /// A client application.
    Client,
    /// A peer node.
    Peer,
    /// An ordering service node.
    Orderer,
}

impl MspRole {
    /// The role's marker name, e.g. `"admin"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MspRole::Member => "member",
            MspRole::Admin => "admin",
            MspRole::Client => "client",
            MspRole::Peer => "peer",
            MspRole::Orderer => "orderer",
        }
    }
}

impl Display for MspRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for MspRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(MspRole::Member),
            "admin" => Ok(MspRole::Admin),
            "client" => Ok(MspRole::Client),
            "peer" => Ok(MspRole::Peer),
            "orderer" => Ok(MspRole::Orderer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// How sub-principals of a [`Principal::Combined`] are composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every sub-principal must be satisfied. Vacuously true when empty.
    All,
    /// At least one sub-principal must be satisfied. False when empty.
    Any,
}

/// A request describing a class of acceptable identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    /// Identities of `msp` holding `role`.
    Role {
        /// Organization identifier.
        msp: String,
        /// Required role.
        role: MspRole,
    },
    /// Identities of `msp` in the unit `unit` as attested by `certifier`.
    OrganizationalUnit {
        /// Organization identifier.
        msp: String,
        /// Fingerprint of the attesting trust material.
        certifier: Fingerprint,
        /// Unit name, matched exactly.
        unit: String,
    },
    /// Exactly the identity with this serialized form.
    Identity(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Only anonymous identities (`true`) or only non-anonymous ones
    /// (`false`).
    Anonymity {
        /// Required anonymity.
        anonymous: bool,
    },
    /// A composition of sub-principals.
    Combined {
        /// How the sub-principals are composed.
        combinator: Combinator,
        /// Sub-principals, evaluated left to right.
        principals: Vec<Principal>,
    },
}

impl Principal {
    /// Shorthand for [`Principal::Role`].
    pub fn role(msp: impl Into<String>, role: MspRole) -> Self {
        Principal::Role {
            msp: msp.into(),
            role,
        }
    }

    /// Shorthand for [`Principal::OrganizationalUnit`].
    pub fn organizational_unit(
        msp: impl Into<String>,
        certifier: Fingerprint,
        unit: impl Into<String>,
    ) -> Self {
        Principal::OrganizationalUnit {
            msp: msp.into(),
            certifier,
            unit: unit.into(),
        }
    }

    /// Shorthand for [`Principal::Identity`].
    pub fn identity(serialized: impl Into<Vec<u8>>) -> Self {
        Principal::Identity(serialized.into())
    }

    /// Shorthand for [`Principal::Anonymity`].
    pub fn anonymity(anonymous: bool) -> Self {
        Principal::Anonymity { anonymous }
    }

    /// All of the given principals.
    pub fn all(principals: impl IntoIterator<Item = Principal>) -> Self {
        Principal::Combined {
            combinator: Combinator::All,
            principals: principals.into_iter().collect(),
        }
    }

    /// Any of the given principals.
    pub fn any(principals: impl IntoIterator<Item = Principal>) -> Self {
        Principal::Combined {
            combinator: Combinator::Any,
            principals: principals.into_iter().collect(),
        }
    }

    /// Classification of this principal.
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Role { .. } => PrincipalKind::Role,
            Principal::OrganizationalUnit { .. } => PrincipalKind::OrganizationalUnit,
            Principal::Identity(_) => PrincipalKind::Identity,
            Principal::Anonymity { .. } => PrincipalKind::Anonymity,
            Principal::Combined { .. } => PrincipalKind::Combined,
        }
    }
}

/// Classification of a [`Principal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalKind {
    /// [`Principal::Role`]
    Role,
    /// [`Principal::OrganizationalUnit`]
    OrganizationalUnit,
    /// [`Principal::Identity`]
    Identity,
    /// [`Principal::Anonymity`]
    Anonymity,
    /// [`Principal::Combined`]
    Combined,
}
