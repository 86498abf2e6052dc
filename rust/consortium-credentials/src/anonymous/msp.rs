use std::collections::HashSet;
use std::sync::Arc;

use consortium_common::{Fingerprint, time};
use consortium_msp::{
    Evaluation, Identity, IdentityIdentifier, Msp, MspConfig, MspError, MspRole, MspVersion,
    OrganizationalUnit, Principal, PrincipalKind, ProviderHandle, ProviderType,
    SerializedIdentity, SigningIdentity,
};
use p256::ecdsa::{SigningKey, VerifyingKey};

use super::{AnonymousIdentity, AnonymousMspConfig, AnonymousSigningIdentity, Credential};

/// A provider for one organization whose members hold anonymous credentials
/// attested by the organization's issuer.
///
/// Identities reveal only what the credential discloses: organization,
/// organizational unit and role. Because those attributes are only
/// meaningful when the issuer attested them, role and unit principals are
/// evaluated here rather than by the generic matcher.
#[derive(Debug)]
pub struct AnonymousMsp {
    handle: ProviderHandle,
    version: MspVersion,
    issuer_key: VerifyingKey,
    certifier: Fingerprint,
    revoked: HashSet<u64>,
    signer: Option<Arc<AnonymousSigningIdentity>>,
}

impl AnonymousMsp {
    /// Build a provider from a [`MspConfig`] carrying an
    /// [`AnonymousMspConfig`] payload.
    pub fn setup(config: &MspConfig) -> Result<Self, MspError> {
        if config.provider_type != ProviderType::Anonymous {
            return Err(MspError::MalformedConfig(format!(
                "expected an anonymous configuration, found {}",
                config.provider_type
            )));
        }

        Self::from_config(AnonymousMspConfig::decode(&config.config)?, config.version)
    }

    /// Build a provider from decoded issuer material.
    pub fn from_config(config: AnonymousMspConfig, version: MspVersion) -> Result<Self, MspError> {
        if config.name.is_empty() {
            return Err(MspError::MalformedConfig(
                "organization identifier is empty".into(),
            ));
        }
        let issuer_key = VerifyingKey::from_sec1_bytes(&config.issuer_public_key).map_err(|_| {
            MspError::UntrustedRoot(format!("issuer key of '{}' is not a P-256 point", config.name))
        })?;

        let mut provider = Self {
            handle: ProviderHandle::new(config.name),
            version,
            certifier: Fingerprint::of(issuer_key.to_encoded_point(true).as_bytes()),
            issuer_key,
            revoked: config.revoked_handles.into_iter().collect(),
            signer: None,
        };

        if let Some(signer) = config.signer {
            provider.signer = Some(Arc::new(
                provider.signing_identity(signer.credential, &signer.nym_secret)?,
            ));
        }

        tracing::debug!(
            msp = provider.identifier(),
            revoked = provider.revoked.len(),
            "Anonymous credential provider ready"
        );
        Ok(provider)
    }

    /// Fingerprint certifying the organizational units of this provider's
    /// identities.
    pub fn certifier(&self) -> &Fingerprint {
        &self.certifier
    }

    fn signing_identity(
        &self,
        credential: Credential,
        secret: &[u8],
    ) -> Result<AnonymousSigningIdentity, MspError> {
        let key = SigningKey::from_slice(secret)
            .map_err(|_| MspError::MalformedConfig("pseudonym secret is not a P-256 scalar".into()))?;
        let nym_key = credential
            .nym_key()
            .map_err(|error| MspError::MalformedConfig(error.to_string()))?;
        if key.verifying_key() != &nym_key {
            return Err(MspError::MalformedConfig(
                "pseudonym secret does not match the credential".into(),
            ));
        }
        credential
            .verify_attestation(&self.issuer_key)
            .map_err(|error| MspError::MalformedConfig(error.to_string()))?;

        let serialized = SerializedIdentity::new(self.identifier(), credential.encode()?)
            .encode()
            .map_err(|error| MspError::MalformedConfig(error.to_string()))?;
        let identity = self.identity_from(credential, serialized)?;
        Ok(AnonymousSigningIdentity::new(identity, key))
    }

    fn identity_from(
        &self,
        credential: Credential,
        serialized: Vec<u8>,
    ) -> Result<AnonymousIdentity, MspError> {
        Ok(AnonymousIdentity {
            identifier: IdentityIdentifier {
                msp: self.identifier().to_string(),
                id: credential.nym_fingerprint().to_string(),
            },
            nym_key: credential.nym_key()?,
            units: vec![OrganizationalUnit::new(
                self.certifier,
                credential.attributes.organizational_unit.as_str(),
            )],
            credential,
            serialized,
            issuer: self.handle.clone(),
        })
    }

    fn downcast<'a>(&self, identity: &'a dyn Identity) -> Result<&'a AnonymousIdentity, MspError> {
        identity
            .as_any()
            .downcast_ref::<AnonymousIdentity>()
            .ok_or_else(|| {
                MspError::MalformedIdentity(format!(
                    "{} is not an anonymous identity",
                    identity.identifier()
                ))
            })
    }

    /// Attributes of `identity`, after re-checking that the issuer attested
    /// them for this organization.
    fn attested<'a>(
        &self,
        identity: &'a dyn Identity,
    ) -> Result<&'a AnonymousIdentity, MspError> {
        let identity = self.downcast(identity)?;
        identity.credential.verify_attestation(&self.issuer_key)?;
        if identity.credential.attributes.msp != self.identifier() {
            return Err(MspError::Untrusted(format!(
                "credential was issued for '{}'",
                identity.credential.attributes.msp
            )));
        }
        Ok(identity)
    }
}

impl Msp for AnonymousMsp {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Anonymous
    }

    fn version(&self) -> MspVersion {
        self.version
    }

    fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        let envelope = SerializedIdentity::decode(serialized)?;
        if envelope.msp != self.identifier() {
            return Err(MspError::unknown_issuer(envelope.msp));
        }
        let credential = Credential::decode(&envelope.id_bytes)?;

        Ok(Arc::new(self.identity_from(credential, serialized.to_vec())?))
    }

    fn is_well_formed(&self, identity: &SerializedIdentity) -> Result<(), MspError> {
        if identity.msp != self.identifier() {
            return Err(MspError::unknown_issuer(&identity.msp));
        }
        Credential::decode(&identity.id_bytes).map(|_| ())
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        self.ensure_issued(identity)?;
        let identity = self.attested(identity)?;
        let attributes = &identity.credential.attributes;

        if identity
            .credential
            .expires_at()
            .is_some_and(|expiry| expiry < time::now())
        {
            return Err(MspError::Expired {
                id: identity.identifier.id.clone(),
            });
        }
        if self.revoked.contains(&attributes.revocation_handle) {
            return Err(MspError::Revoked {
                id: identity.identifier.id.clone(),
            });
        }

        Ok(())
    }

    fn evaluation(&self, kind: PrincipalKind) -> Evaluation {
        match kind {
            PrincipalKind::Role | PrincipalKind::OrganizationalUnit => Evaluation::Scheme,
            _ => Evaluation::Generic,
        }
    }

    fn satisfies_scheme_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        let identity = self.attested(identity)?;
        let attributes = &identity.credential.attributes;

        let satisfied = match principal {
            Principal::Role { msp, role } => {
                msp == self.identifier() && (*role == MspRole::Member || *role == attributes.role)
            }
            Principal::OrganizationalUnit {
                msp,
                certifier,
                unit,
            } => {
                msp == self.identifier()
                    && certifier == &self.certifier
                    && unit == &attributes.organizational_unit
            }
            principal => {
                return Err(MspError::mismatch(format!(
                    "anonymous providers do not evaluate {:?} principals themselves",
                    principal.kind()
                )));
            }
        };

        if satisfied {
            Ok(())
        } else {
            Err(MspError::mismatch(format!(
                "credential of {} does not disclose {:?}",
                identity.identifier,
                principal.kind()
            )))
        }
    }

    fn default_signing_identity(&self) -> Result<Arc<dyn SigningIdentity>, MspError> {
        self.signer
            .clone()
            .map(|signer| signer as Arc<dyn SigningIdentity>)
            .ok_or_else(|| {
                MspError::NotConfigured(format!(
                    "no anonymous credential configured for {}",
                    self.identifier()
                ))
            })
    }
}
