use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use consortium_common::{Fingerprint, time};
use consortium_msp::{
    Evaluation, Identity, IdentityIdentifier, Msp, MspConfig, MspError, MspRole, MspVersion,
    OrganizationalUnit, Principal, PrincipalKind, ProviderHandle, ProviderType,
    SerializedIdentity, SigningIdentity,
};
use ed25519_dalek::{SigningKey, VerifyingKey};

use super::{
    Certificate, CertificateIdentity, CertificateMspConfig, CertificateSigningIdentity,
    OrganizationalUnitIdentifier, RevokedCertificate, body::PUBLIC_KEY_SIZE,
};

type KeyBytes = [u8; PUBLIC_KEY_SIZE];

/// A CA certificate accepted at setup.
#[derive(Debug, Clone)]
struct TrustedCa {
    certificate: Certificate,
    fingerprint: Fingerprint,
    key: VerifyingKey,
    /// Key of the issuing CA, `None` for roots.
    parent: Option<KeyBytes>,
}

/// A provider for one organization whose members hold certificates issued
/// by the organization's CAs.
///
/// Every intermediate CA must chain to one of the configured roots at setup
/// time, so validating an identity only walks already-trusted links.
#[derive(Debug)]
pub struct CertificateMsp {
    handle: ProviderHandle,
    version: MspVersion,
    authorities: BTreeMap<KeyBytes, TrustedCa>,
    admins: HashSet<Fingerprint>,
    revoked: HashSet<RevokedCertificate>,
    unit_identifiers: HashSet<OrganizationalUnitIdentifier>,
    signer: Option<Arc<CertificateSigningIdentity>>,
    tls_root_certs: Vec<Vec<u8>>,
    tls_intermediate_certs: Vec<Vec<u8>>,
}

impl CertificateMsp {
    /// Build a provider from a [`MspConfig`] carrying a
    /// [`CertificateMspConfig`] payload.
    pub fn setup(config: &MspConfig) -> Result<Self, MspError> {
        if config.provider_type != ProviderType::Certificate {
            return Err(MspError::MalformedConfig(format!(
                "expected a certificate configuration, found {}",
                config.provider_type
            )));
        }

        Self::from_config(CertificateMspConfig::decode(&config.config)?, config.version)
    }

    /// Build a provider from decoded trust material.
    pub fn from_config(config: CertificateMspConfig, version: MspVersion) -> Result<Self, MspError> {
        if config.name.is_empty() {
            return Err(MspError::MalformedConfig(
                "organization identifier is empty".into(),
            ));
        }
        if config.root_certs.is_empty() {
            return Err(MspError::MalformedConfig(format!(
                "no root certificates configured for '{}'",
                config.name
            )));
        }

        let mut authorities = BTreeMap::new();
        for root in config.root_certs {
            let trusted = Self::trust_root(root)?;
            authorities.insert(*trusted.key.as_bytes(), trusted);
        }
        Self::trust_intermediates(&mut authorities, config.intermediate_certs)?;

        let mut provider = Self {
            handle: ProviderHandle::new(config.name),
            version,
            authorities,
            admins: HashSet::new(),
            revoked: config.revocation_list.into_iter().collect(),
            unit_identifiers: HashSet::new(),
            signer: None,
            tls_root_certs: config
                .tls_root_certs
                .into_iter()
                .map(|cert| cert.into_vec())
                .collect(),
            tls_intermediate_certs: config
                .tls_intermediate_certs
                .into_iter()
                .map(|cert| cert.into_vec())
                .collect(),
        };

        for admin in config.admins {
            provider.issuing_authority(&admin).map_err(|error| {
                MspError::MalformedConfig(format!(
                    "admin certificate '{}' is not trusted: {error}",
                    admin.body.subject
                ))
            })?;
            provider.admins.insert(admin.fingerprint()?);
        }

        for identifier in config.organizational_unit_identifiers {
            if !provider
                .authorities
                .values()
                .any(|ca| ca.fingerprint == identifier.certifier)
            {
                return Err(MspError::MalformedConfig(format!(
                    "organizational unit '{}' is certified by an unknown CA",
                    identifier.unit
                )));
            }
            provider.unit_identifiers.insert(identifier);
        }

        if let Some(signer) = config.signing_identity {
            provider.signer = Some(Arc::new(provider.signing_identity(
                signer.certificate,
                &signer.private_key,
            )?));
        }

        tracing::debug!(
            msp = provider.identifier(),
            authorities = provider.authorities.len(),
            admins = provider.admins.len(),
            "Certificate provider ready"
        );
        Ok(provider)
    }

    fn trust_root(root: Certificate) -> Result<TrustedCa, MspError> {
        let subject = root.body.subject.clone();
        let untrusted = |reason: &str| MspError::UntrustedRoot(format!("'{subject}' {reason}"));

        if !root.body.is_ca {
            return Err(untrusted("is not a CA certificate"));
        }
        if !root.is_self_issued() {
            return Err(untrusted("is not self-signed"));
        }
        let key = root
            .public_key()
            .map_err(|_| untrusted("carries an invalid key"))?;
        root.verify_issued_by(&key)
            .map_err(|_| untrusted("has an invalid self-signature"))?;

        Ok(TrustedCa {
            fingerprint: root.fingerprint()?,
            certificate: root,
            key,
            parent: None,
        })
    }

    /// Accept intermediates in rounds until every one of them chains to an
    /// accepted CA, or no progress is made.
    fn trust_intermediates(
        authorities: &mut BTreeMap<KeyBytes, TrustedCa>,
        mut pending: Vec<Certificate>,
    ) -> Result<(), MspError> {
        while !pending.is_empty() {
            let before = pending.len();
            let mut remaining = Vec::new();

            for certificate in pending {
                let parent = certificate
                    .body
                    .issuer_key
                    .as_slice()
                    .try_into()
                    .ok()
                    .filter(|parent: &KeyBytes| authorities.contains_key(parent));

                match parent {
                    Some(parent) => {
                        let untrusted = |reason: &str| {
                            MspError::UntrustedRoot(format!(
                                "intermediate '{}' {reason}",
                                certificate.body.subject
                            ))
                        };
                        if !certificate.body.is_ca {
                            return Err(untrusted("is not a CA certificate"));
                        }
                        let issuer = &authorities[&parent];
                        certificate
                            .verify_issued_by(&issuer.key)
                            .map_err(|_| untrusted("is not signed by its issuer"))?;
                        let key = certificate
                            .public_key()
                            .map_err(|_| untrusted("carries an invalid key"))?;

                        authorities.insert(
                            *key.as_bytes(),
                            TrustedCa {
                                fingerprint: certificate.fingerprint()?,
                                certificate,
                                key,
                                parent: Some(parent),
                            },
                        );
                    }
                    None => remaining.push(certificate),
                }
            }

            if remaining.len() == before {
                let subjects = remaining
                    .iter()
                    .map(|certificate| certificate.body.subject.as_str())
                    .collect::<Vec<_>>();
                return Err(MspError::UntrustedRoot(format!(
                    "intermediates {subjects:?} do not chain to a root"
                )));
            }
            pending = remaining;
        }

        Ok(())
    }

    fn signing_identity(
        &self,
        certificate: Certificate,
        seed: &[u8],
    ) -> Result<CertificateSigningIdentity, MspError> {
        let seed: [u8; 32] = seed.try_into().map_err(|_| {
            MspError::MalformedConfig(format!(
                "signing key must be a 32 byte seed, found {} bytes",
                seed.len()
            ))
        })?;
        let key = SigningKey::from_bytes(&seed);
        if key.verifying_key().as_bytes() != certificate.body.public_key.as_slice() {
            return Err(MspError::MalformedConfig(format!(
                "signing key does not match the certificate of '{}'",
                certificate.body.subject
            )));
        }

        let serialized = SerializedIdentity::new(self.identifier(), certificate.encode()?)
            .encode()
            .map_err(|error| MspError::MalformedConfig(error.to_string()))?;
        let identity = self.identity_from(certificate, serialized)?;
        Ok(CertificateSigningIdentity::new(identity, key))
    }

    fn identity_from(
        &self,
        certificate: Certificate,
        serialized: Vec<u8>,
    ) -> Result<CertificateIdentity, MspError> {
        let key = certificate.public_key()?;
        let fingerprint = certificate.fingerprint()?;

        // Units only carry a certifier when the issuer is one of ours.
        let units = match self.authorities.get(certificate.body.issuer_key.as_slice()) {
            Some(ca) => certificate
                .body
                .organizational_units
                .iter()
                .map(|unit| OrganizationalUnit::new(ca.fingerprint, unit.as_str()))
                .collect(),
            None => vec![],
        };

        Ok(CertificateIdentity {
            identifier: IdentityIdentifier {
                msp: self.identifier().to_string(),
                id: fingerprint.to_string(),
            },
            certificate,
            fingerprint,
            key,
            units,
            serialized,
            issuer: self.handle.clone(),
        })
    }

    fn issuing_authority(&self, certificate: &Certificate) -> Result<&TrustedCa, MspError> {
        let ca = self
            .authorities
            .get(certificate.body.issuer_key.as_slice())
            .ok_or_else(|| {
                MspError::Untrusted(format!(
                    "'{}' is not issued by a CA of {}",
                    certificate.body.subject,
                    self.identifier()
                ))
            })?;
        certificate.verify_issued_by(&ca.key).map_err(|error| {
            MspError::Untrusted(format!("'{}': {error}", certificate.body.subject))
        })?;
        Ok(ca)
    }

    /// The CA chain issuing `certificate`, from the issuer up to a root.
    fn chain(&self, certificate: &Certificate) -> Result<Vec<&TrustedCa>, MspError> {
        let mut chain = vec![self.issuing_authority(certificate)?];
        while let Some(parent) = chain.last().and_then(|ca| ca.parent) {
            let ca = self.authorities.get(&parent).ok_or_else(|| {
                MspError::Untrusted(format!(
                    "broken chain above '{}'",
                    certificate.body.subject
                ))
            })?;
            chain.push(ca);
        }
        Ok(chain)
    }

    fn downcast<'a>(&self, identity: &'a dyn Identity) -> Result<&'a CertificateIdentity, MspError> {
        identity
            .as_any()
            .downcast_ref::<CertificateIdentity>()
            .ok_or_else(|| {
                MspError::MalformedIdentity(format!(
                    "{} is not a certificate identity",
                    identity.identifier()
                ))
            })
    }

    fn is_admin(&self, identity: &CertificateIdentity) -> bool {
        self.admins.contains(&identity.fingerprint)
            || identity
                .units
                .iter()
                .any(|unit| unit.unit == MspRole::Admin.as_str())
    }
}

impl Msp for CertificateMsp {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Certificate
    }

    fn version(&self) -> MspVersion {
        self.version
    }

    fn handle(&self) -> &ProviderHandle {
        &self.handle
    }

    fn tls_root_certs(&self) -> &[Vec<u8>] {
        &self.tls_root_certs
    }

    fn tls_intermediate_certs(&self) -> &[Vec<u8>] {
        &self.tls_intermediate_certs
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        let envelope = SerializedIdentity::decode(serialized)?;
        if envelope.msp != self.identifier() {
            return Err(MspError::unknown_issuer(envelope.msp));
        }
        let certificate = Certificate::decode(&envelope.id_bytes)?;

        Ok(Arc::new(self.identity_from(certificate, serialized.to_vec())?))
    }

    fn is_well_formed(&self, identity: &SerializedIdentity) -> Result<(), MspError> {
        if identity.msp != self.identifier() {
            return Err(MspError::unknown_issuer(&identity.msp));
        }
        Certificate::decode(&identity.id_bytes).map(|_| ())
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        self.ensure_issued(identity)?;
        let identity = self.downcast(identity)?;
        let certificate = &identity.certificate;
        let id = || identity.identifier.id.clone();

        if certificate.body.is_ca {
            return Err(MspError::Untrusted(format!(
                "CA certificate '{}' cannot act as an identity",
                certificate.body.subject
            )));
        }

        let chain = self.chain(certificate)?;

        let now = time::now();
        if certificate.is_expired_at(now)
            || chain.iter().any(|ca| ca.certificate.is_expired_at(now))
        {
            return Err(MspError::Expired { id: id() });
        }

        let mut serial = certificate.body.serial;
        for ca in &chain {
            if self.revoked.contains(&RevokedCertificate {
                issuer: ca.fingerprint,
                serial,
            }) {
                return Err(MspError::Revoked { id: id() });
            }
            serial = ca.certificate.body.serial;
        }

        if !self.unit_identifiers.is_empty()
            && !identity.units.iter().any(|unit| {
                self.unit_identifiers.contains(&OrganizationalUnitIdentifier {
                    certifier: unit.certifier,
                    unit: unit.unit.clone(),
                })
            })
        {
            return Err(MspError::Untrusted(format!(
                "{} belongs to none of the configured organizational units",
                identity.identifier
            )));
        }

        Ok(())
    }

    fn valid_until(&self, identity: &dyn Identity) -> Option<time::SystemTime> {
        let Ok(certificate_identity) = self.downcast(identity) else {
            return identity.expires_at();
        };
        let certificate = &certificate_identity.certificate;
        let chain = self.chain(certificate).unwrap_or_default();

        std::iter::once(certificate)
            .chain(chain.iter().map(|ca| &ca.certificate))
            .filter_map(Certificate::expires_at)
            .min()
    }

    fn evaluation(&self, kind: PrincipalKind) -> Evaluation {
        match kind {
            PrincipalKind::Role => Evaluation::Scheme,
            _ => Evaluation::Generic,
        }
    }

    fn satisfies_scheme_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        let Principal::Role { msp, role } = principal else {
            return Err(MspError::mismatch(format!(
                "certificate providers do not evaluate {:?} principals themselves",
                principal.kind()
            )));
        };
        if msp != self.identifier() {
            return Err(MspError::mismatch(format!(
                "{} is not a member of {msp}",
                identity.identifier()
            )));
        }

        let identity = self.downcast(identity)?;
        let satisfied = match role {
            MspRole::Member => true,
            MspRole::Admin => self.is_admin(identity),
            role => identity.units.iter().any(|unit| unit.unit == role.as_str()),
        };

        if satisfied {
            Ok(())
        } else {
            Err(MspError::mismatch(format!(
                "{} does not hold the {role} role",
                identity.identifier
            )))
        }
    }

    fn default_signing_identity(&self) -> Result<Arc<dyn SigningIdentity>, MspError> {
        self.signer
            .clone()
            .map(|signer| signer as Arc<dyn SigningIdentity>)
            .ok_or_else(|| {
                MspError::NotConfigured(format!(
                    "no signing identity configured for {}",
                    self.identifier()
                ))
            })
    }
}
