//! Protected resource names and the tables mapping them to policies.

use std::collections::{BTreeMap, BTreeSet};

use consortium_msp::Principal;
use serde::{Deserialize, Serialize};

/// Submitting a proposal to a peer.
pub const PEER_PROPOSE: &str = "peer/Propose";
/// One chaincode invoking another.
pub const PEER_CHAINCODE_TO_CHAINCODE: &str = "peer/ChaincodeToChaincode";
/// Receiving full blocks from the event service.
pub const EVENT_BLOCK: &str = "event/Block";
/// Receiving filtered blocks from the event service.
pub const EVENT_FILTERED_BLOCK: &str = "event/FilteredBlock";
/// Reading a channel's configuration block.
pub const CSCC_GET_CONFIG_BLOCK: &str = "cscc/GetConfigBlock";
/// Joining a channel.
pub const CSCC_JOIN_CHAIN: &str = "cscc/JoinChain";
/// Listing the channels a peer has joined.
pub const CSCC_GET_CHANNELS: &str = "cscc/GetChannels";
/// Reading ledger height and hashes.
pub const QSCC_GET_CHAIN_INFO: &str = "qscc/GetChainInfo";
/// Reading a block by number.
pub const QSCC_GET_BLOCK_BY_NUMBER: &str = "qscc/GetBlockByNumber";
/// Reading a transaction by id.
pub const QSCC_GET_TRANSACTION_BY_ID: &str = "qscc/GetTransactionByID";
/// Installing a chaincode package on a peer.
pub const LSCC_INSTALL: &str = "lscc/Install";
/// Creating a channel.
pub const CHANNEL_CREATE: &str = "channel.create";

/// Where the policy guarding a resource comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRef {
    /// A concrete principal.
    Principal(Principal),
    /// A named policy, resolved at evaluation time.
    Alias(String),
}

impl From<Principal> for PolicyRef {
    fn from(principal: Principal) -> Self {
        PolicyRef::Principal(principal)
    }
}

/// Resource to policy mappings plus the named policies aliases refer to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclTable {
    /// Resource name to policy.
    #[serde(default)]
    pub acls: BTreeMap<String, PolicyRef>,
    /// Named policies.
    #[serde(default)]
    pub policies: BTreeMap<String, PolicyRef>,
}

impl AclTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard `resource` with `policy`.
    pub fn with_acl(mut self, resource: impl Into<String>, policy: impl Into<PolicyRef>) -> Self {
        self.acls.insert(resource.into(), policy.into());
        self
    }

    /// Define the named policy `name`.
    pub fn with_policy(mut self, name: impl Into<String>, policy: impl Into<PolicyRef>) -> Self {
        self.policies.insert(name.into(), policy.into());
        self
    }

    /// The policy guarding `resource`, if any.
    pub fn resource(&self, resource: &str) -> Option<&PolicyRef> {
        self.acls.get(resource)
    }

    /// Follow aliases through the named policies until a principal is
    /// reached. Dangling and cyclic aliases resolve to `None`.
    pub fn resolve(&self, policy: &PolicyRef) -> Option<Principal> {
        let mut seen = BTreeSet::new();
        let mut current = policy;
        loop {
            match current {
                PolicyRef::Principal(principal) => return Some(principal.clone()),
                PolicyRef::Alias(name) => {
                    if !seen.insert(name.as_str()) {
                        tracing::warn!(policy = %name, "Cyclic policy alias");
                        return None;
                    }
                    current = self.policies.get(name)?;
                }
            }
        }
    }

    /// Resolve the policy guarding `resource`.
    pub fn resolve_resource(&self, resource: &str) -> Option<Principal> {
        self.resolve(self.resource(resource)?)
    }
}
