//! Membership managers route serialized identities to the provider that
//! issued them.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use consortium_common::Snapshot;

use crate::{Identity, Msp, MspError, Principal, SerializedIdentity};

/// Read-only view of the providers installed in one scope, keyed by
/// organization identifier.
pub type MspMap = BTreeMap<String, Arc<dyn Msp>>;

/// An identity together with the provider that created it.
///
/// Both halves come from the same provider set, so checks made through a
/// resolved identity are unaffected by concurrent reconfiguration.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    msp: Arc<dyn Msp>,
    identity: Arc<dyn Identity>,
}

impl ResolvedIdentity {
    /// Pair an identity with its provider.
    pub fn new(msp: Arc<dyn Msp>, identity: Arc<dyn Identity>) -> Self {
        Self { msp, identity }
    }

    /// The provider that created the identity.
    pub fn msp(&self) -> &Arc<dyn Msp> {
        &self.msp
    }

    /// The identity.
    pub fn identity(&self) -> &Arc<dyn Identity> {
        &self.identity
    }

    /// Full trust evaluation by the issuing provider.
    pub fn validate(&self) -> Result<(), MspError> {
        self.msp.validate(self.identity.as_ref())
    }

    /// Verify a signature made by the identity.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MspError> {
        self.identity.verify(message, signature)
    }

    /// Principal evaluation by the issuing provider.
    pub fn satisfies_principal(&self, principal: &Principal) -> Result<(), MspError> {
        self.msp.satisfies_principal(self.identity.as_ref(), principal)
    }
}

/// The capability exposed by a membership manager.
pub trait MspManager: Debug + Send + Sync {
    /// Resolve a serialized identity to its issuing provider and decode it.
    fn resolve_identity(&self, serialized: &[u8]) -> Result<ResolvedIdentity, MspError>;

    /// Decode a serialized identity with the provider that issued it.
    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        Ok(self.resolve_identity(serialized)?.identity)
    }

    /// Structural check with the provider that issued the identity.
    fn is_well_formed(&self, serialized: &[u8]) -> Result<(), MspError>;

    /// Snapshot of installed providers.
    fn msps(&self) -> Result<MspMap, MspError>;
}

/// Copy-on-write [`MspManager`] for one scope.
///
/// Starts uninitialized; every call to [`MembershipManager::setup`] replaces
/// the whole provider set at once.
#[derive(Debug)]
pub struct MembershipManager {
    scope: String,
    providers: Snapshot<Option<MspMap>>,
}

impl MembershipManager {
    /// Create an uninitialized manager for the named scope.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            providers: Snapshot::new(None),
        }
    }

    /// Name of the scope this manager serves.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Whether [`MembershipManager::setup`] has completed at least once.
    pub fn is_ready(&self) -> bool {
        self.providers.load().is_some()
    }

    /// Install a new provider set, replacing the previous one atomically.
    ///
    /// Fails with [`MspError::MalformedConfig`], leaving the previous set in
    /// place, when two providers claim the same organization.
    pub fn setup(
        &self,
        providers: impl IntoIterator<Item = Arc<dyn Msp>>,
    ) -> Result<(), MspError> {
        let mut map = MspMap::new();
        for provider in providers {
            let msp = provider.identifier().to_string();
            if map.insert(msp.clone(), provider).is_some() {
                return Err(MspError::MalformedConfig(format!(
                    "duplicate provider for organization '{msp}' in scope '{}'",
                    self.scope
                )));
            }
        }

        tracing::info!(
            scope = %self.scope,
            organizations = ?map.keys().collect::<Vec<_>>(),
            "Installing membership providers"
        );
        self.providers.store(Some(map));
        Ok(())
    }

    fn with_providers<R>(
        &self,
        use_providers: impl FnOnce(&MspMap) -> Result<R, MspError>,
    ) -> Result<R, MspError> {
        match self.providers.load().as_ref() {
            Some(map) => use_providers(map),
            None => Err(MspError::NotConfigured(format!(
                "membership manager for scope '{}' has not been set up",
                self.scope
            ))),
        }
    }

    fn lookup(map: &MspMap, msp: &str) -> Result<Arc<dyn Msp>, MspError> {
        map.get(msp)
            .cloned()
            .ok_or_else(|| MspError::unknown_issuer(msp))
    }
}

impl MspManager for MembershipManager {
    fn resolve_identity(&self, serialized: &[u8]) -> Result<ResolvedIdentity, MspError> {
        self.with_providers(|map| {
            let envelope = SerializedIdentity::decode(serialized)?;
            let msp = Self::lookup(map, &envelope.msp)?;
            tracing::debug!(scope = %self.scope, msp = %envelope.msp, "Dispatching identity");

            let identity = msp.deserialize_identity(serialized)?;
            Ok(ResolvedIdentity::new(msp, identity))
        })
    }

    fn is_well_formed(&self, serialized: &[u8]) -> Result<(), MspError> {
        self.with_providers(|map| {
            let envelope = SerializedIdentity::decode(serialized)?;
            Self::lookup(map, &envelope.msp)?.is_well_formed(&envelope)
        })
    }

    fn msps(&self) -> Result<MspMap, MspError> {
        self.with_providers(|map| Ok(map.clone()))
    }
}
