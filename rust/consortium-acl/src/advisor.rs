use std::fmt::Debug;
use std::sync::Arc;

use consortium_msp::{ManagerRegistry, MspManager};

/// Maps raw peer identities to the organization that issued them.
pub trait SecurityAdvisor: Debug + Send + Sync {
    /// The organization that issued `identity`, or `None` when no installed
    /// manager recognizes it.
    ///
    /// An unknown organization is a normal outcome for peers this node has
    /// not learned about yet, not an error.
    fn org_by_identity(&self, identity: &[u8]) -> Option<String>;
}

/// [`SecurityAdvisor`] backed by the managers of a [`ManagerRegistry`]: the
/// local manager first, then every channel manager.
#[derive(Debug, Clone)]
pub struct MembershipAdvisor {
    registry: Arc<ManagerRegistry>,
}

impl MembershipAdvisor {
    /// Create an advisor over `registry`.
    pub fn new(registry: Arc<ManagerRegistry>) -> Self {
        Self { registry }
    }

    fn organization(manager: &dyn MspManager, identity: &[u8]) -> Option<String> {
        manager
            .deserialize_identity(identity)
            .ok()
            .map(|identity| identity.msp_identifier().to_string())
    }
}

impl SecurityAdvisor for MembershipAdvisor {
    fn org_by_identity(&self, identity: &[u8]) -> Option<String> {
        if let Some(msp) = Self::organization(self.registry.local().as_ref(), identity) {
            return Some(msp);
        }

        let found = self
            .registry
            .channel_managers()
            .into_iter()
            .find_map(|(_, manager)| Self::organization(manager.as_ref(), identity));

        if found.is_none() {
            tracing::debug!("No membership manager recognizes the identity");
        }
        found
    }
}
