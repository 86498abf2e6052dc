//! Identity cache.

use std::sync::Arc;

use consortium_common::{Fingerprint, time};
use consortium_msp::{
    Evaluation, Identity, Msp, MspError, MspVersion, Principal, PrincipalKind, ProviderHandle,
    ProviderType, SerializedIdentity, SigningIdentity,
};
use sieve_cache::ShardedSieveCache;

/// Default number of entries kept per cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Wraps a provider and remembers deserialized identities and successful
/// validations, keyed by the fingerprint of the serialized identity.
///
/// A validation is remembered together with the instant it stops holding
/// (see [`Msp::valid_until`]) and re-checked against it on every hit;
/// failures are never cached.
pub struct CachedMsp<M: Msp> {
    inner: M,
    identities: ShardedSieveCache<Fingerprint, Arc<dyn Identity>>,
    validated: ShardedSieveCache<Fingerprint, Option<time::SystemTime>>,
}

impl<M: Msp> std::fmt::Debug for CachedMsp<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedMsp")
            .field("inner", &self.inner)
            .field("identities", &self.identities.len())
            .field("validated", &self.validated.len())
            .finish()
    }
}

impl<M: Msp> CachedMsp<M> {
    /// Wrap `inner` with caches of `capacity` entries each.
    pub fn new(inner: M, capacity: usize) -> Result<Self, MspError> {
        Ok(Self {
            identities: Self::cache(capacity)?,
            validated: Self::cache(capacity)?,
            inner,
        })
    }

    /// Wrap `inner` with caches of [`DEFAULT_CACHE_CAPACITY`] entries each.
    pub fn with_default_capacity(inner: M) -> Result<Self, MspError> {
        Self::new(inner, DEFAULT_CACHE_CAPACITY)
    }

    fn cache<V: Clone + Send + Sync>(
        capacity: usize,
    ) -> Result<ShardedSieveCache<Fingerprint, V>, MspError> {
        ShardedSieveCache::new(capacity)
            .map_err(|error| MspError::MalformedConfig(format!("cannot create cache: {error}")))
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

impl<M: Msp> Msp for CachedMsp<M> {
    fn provider_type(&self) -> ProviderType {
        self.inner.provider_type()
    }

    fn version(&self) -> MspVersion {
        self.inner.version()
    }

    fn handle(&self) -> &ProviderHandle {
        self.inner.handle()
    }

    fn tls_root_certs(&self) -> &[Vec<u8>] {
        self.inner.tls_root_certs()
    }

    fn tls_intermediate_certs(&self) -> &[Vec<u8>] {
        self.inner.tls_intermediate_certs()
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        let key = Fingerprint::of(serialized);
        if let Some(identity) = self.identities.get(&key) {
            return Ok(identity);
        }

        let identity = self.inner.deserialize_identity(serialized)?;
        self.identities.insert(key, identity.clone());
        Ok(identity)
    }

    fn is_well_formed(&self, identity: &SerializedIdentity) -> Result<(), MspError> {
        self.inner.is_well_formed(identity)
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        self.ensure_issued(identity)?;

        let key = Fingerprint::of(&identity.serialize());
        if let Some(deadline) = self.validated.get(&key) {
            if !deadline.is_some_and(|deadline| deadline < time::now()) {
                return Ok(());
            }
            self.validated.remove(&key);
            return Err(MspError::Expired {
                id: identity.identifier().id.clone(),
            });
        }

        self.inner.validate(identity)?;
        self.validated.insert(key, self.inner.valid_until(identity));
        Ok(())
    }

    fn valid_until(&self, identity: &dyn Identity) -> Option<time::SystemTime> {
        self.inner.valid_until(identity)
    }

    fn evaluation(&self, kind: PrincipalKind) -> Evaluation {
        self.inner.evaluation(kind)
    }

    fn satisfies_scheme_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        self.inner.satisfies_scheme_principal(identity, principal)
    }

    fn default_signing_identity(&self) -> Result<Arc<dyn SigningIdentity>, MspError> {
        self.inner.default_signing_identity()
    }
}
