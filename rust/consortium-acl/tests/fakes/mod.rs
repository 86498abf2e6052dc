//! Hand-written membership fakes driven by tables of expected signer bytes
//! and canned outcomes.

#![allow(dead_code)]

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use consortium_acl::SignedData;
use consortium_msp::{
    Identity, IdentityIdentifier, Msp, MspError, MspManager, MspMap, MspVersion,
    OrganizationalUnit, Principal, ProviderHandle, ProviderType, ResolvedIdentity,
    SerializedIdentity, SigningIdentity,
};

/// Signature the fakes accept for `message`.
pub fn signature_for(message: &[u8]) -> Vec<u8> {
    [b"sig:".as_slice(), message].concat()
}

/// A request from `signer` carrying a valid signature over `message`.
pub fn request(signer: &[u8], message: &[u8]) -> SignedData {
    SignedData::new(signer.to_vec(), message.to_vec(), signature_for(message))
}

/// Canned behavior of one signer.
#[derive(Debug, Clone)]
pub struct Canned {
    msp: String,
    validation: Result<(), MspError>,
    principals: Vec<(Principal, Result<(), MspError>)>,
}

impl Canned {
    /// A valid identity of `msp` satisfying no principal yet.
    pub fn member_of(msp: &str) -> Self {
        Self {
            msp: msp.to_string(),
            validation: Ok(()),
            principals: vec![],
        }
    }

    /// Make `validate` fail with `error`.
    pub fn invalid(mut self, error: MspError) -> Self {
        self.validation = Err(error);
        self
    }

    /// Answer `principal` with `outcome`.
    pub fn answering(mut self, principal: Principal, outcome: Result<(), MspError>) -> Self {
        self.principals.push((principal, outcome));
        self
    }

    /// Satisfy `principal`.
    pub fn satisfying(self, principal: Principal) -> Self {
        self.answering(principal, Ok(()))
    }
}

#[derive(Debug)]
struct FakeIdentity {
    identifier: IdentityIdentifier,
    issuer: ProviderHandle,
    serialized: Vec<u8>,
}

impl Identity for FakeIdentity {
    fn identifier(&self) -> &IdentityIdentifier {
        &self.identifier
    }
    fn organizational_units(&self) -> &[OrganizationalUnit] {
        &[]
    }
    fn expires_at(&self) -> Option<SystemTime> {
        None
    }
    fn anonymous(&self) -> bool {
        false
    }
    fn issuer(&self) -> &ProviderHandle {
        &self.issuer
    }
    fn serialize(&self) -> Vec<u8> {
        self.serialized.clone()
    }
    fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), MspError> {
        if signature == signature_for(message) {
            Ok(())
        } else {
            Err(MspError::SignatureInvalid("fake signature mismatch".into()))
        }
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct FakeMsp {
    handle: ProviderHandle,
    canned: Canned,
    validations: Arc<AtomicUsize>,
}

impl Msp for FakeMsp {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Certificate
    }
    fn version(&self) -> MspVersion {
        MspVersion::default()
    }
    fn handle(&self) -> &ProviderHandle {
        &self.handle
    }
    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        Ok(Arc::new(FakeIdentity {
            identifier: IdentityIdentifier {
                msp: self.canned.msp.clone(),
                id: String::from_utf8_lossy(serialized).into_owned(),
            },
            issuer: self.handle.clone(),
            serialized: serialized.to_vec(),
        }))
    }
    fn is_well_formed(&self, _identity: &SerializedIdentity) -> Result<(), MspError> {
        Ok(())
    }
    fn validate(&self, _identity: &dyn Identity) -> Result<(), MspError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        self.canned.validation.clone()
    }
    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        self.validate(identity)?;
        self.canned
            .principals
            .iter()
            .find(|(expected, _)| expected == principal)
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Err(MspError::mismatch("no canned answer")))
    }
    fn default_signing_identity(&self) -> Result<Arc<dyn SigningIdentity>, MspError> {
        Err(MspError::NotConfigured("fake".into()))
    }
}

/// An [`MspManager`] answering from a table of signer bytes.
#[derive(Debug, Default)]
pub struct FakeManager {
    expected: HashMap<Vec<u8>, Result<Canned, MspError>>,
    calls: Mutex<Vec<Vec<u8>>>,
    validations: Arc<AtomicUsize>,
}

impl FakeManager {
    /// A manager that expects no signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `signer` to `canned`.
    pub fn expect(mut self, signer: &[u8], canned: Canned) -> Self {
        self.expected.insert(signer.to_vec(), Ok(canned));
        self
    }

    /// Fail to resolve `signer` with `error`.
    pub fn reject(mut self, signer: &[u8], error: MspError) -> Self {
        self.expected.insert(signer.to_vec(), Err(error));
        self
    }

    /// Signers this manager was asked about, in order.
    pub fn calls(&self) -> Vec<Vec<u8>> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of validations run by providers of this manager.
    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

impl MspManager for FakeManager {
    fn resolve_identity(&self, serialized: &[u8]) -> Result<ResolvedIdentity, MspError> {
        self.calls.lock().unwrap().push(serialized.to_vec());

        let canned = match self.expected.get(serialized) {
            Some(Ok(canned)) => canned.clone(),
            Some(Err(error)) => return Err(error.clone()),
            None => return Err(MspError::unknown_issuer("unexpected")),
        };
        let msp = Arc::new(FakeMsp {
            handle: ProviderHandle::new(canned.msp.as_str()),
            canned,
            validations: self.validations.clone(),
        });
        let identity = msp.deserialize_identity(serialized)?;
        Ok(ResolvedIdentity::new(msp, identity))
    }

    fn is_well_formed(&self, serialized: &[u8]) -> Result<(), MspError> {
        self.resolve_identity(serialized).map(|_| ())
    }

    fn msps(&self) -> Result<MspMap, MspError> {
        Ok(MspMap::new())
    }
}
