//! The closed set of credential schemes.

use std::sync::Arc;
use std::time::SystemTime;

use consortium_msp::{
    Evaluation, Identity, Msp, MspConfig, MspError, MspVersion, Principal, PrincipalKind,
    ProviderHandle, ProviderType, SerializedIdentity, SigningIdentity,
};

use crate::{AnonymousMsp, CertificateMsp};

/// A provider of any supported scheme, built from an [`MspConfig`].
#[derive(Debug)]
pub enum CredentialProvider {
    /// Certificate-chain provider.
    Certificate(CertificateMsp),
    /// Anonymous-credential provider.
    Anonymous(AnonymousMsp),
}

impl CredentialProvider {
    /// Build the provider the configuration's scheme calls for.
    pub fn setup(config: &MspConfig) -> Result<Self, MspError> {
        let provider = match config.provider_type {
            ProviderType::Certificate => Self::Certificate(CertificateMsp::setup(config)?),
            ProviderType::Anonymous => Self::Anonymous(AnonymousMsp::setup(config)?),
        };

        tracing::info!(
            msp = provider.identifier(),
            provider_type = %config.provider_type,
            version = ?config.version,
            "Provider set up"
        );
        Ok(provider)
    }

    fn inner(&self) -> &dyn Msp {
        match self {
            Self::Certificate(msp) => msp,
            Self::Anonymous(msp) => msp,
        }
    }
}

impl From<CertificateMsp> for CredentialProvider {
    fn from(msp: CertificateMsp) -> Self {
        Self::Certificate(msp)
    }
}

impl From<AnonymousMsp> for CredentialProvider {
    fn from(msp: AnonymousMsp) -> Self {
        Self::Anonymous(msp)
    }
}

impl Msp for CredentialProvider {
    fn provider_type(&self) -> ProviderType {
        self.inner().provider_type()
    }

    fn version(&self) -> MspVersion {
        self.inner().version()
    }

    fn handle(&self) -> &ProviderHandle {
        self.inner().handle()
    }

    fn tls_root_certs(&self) -> &[Vec<u8>] {
        self.inner().tls_root_certs()
    }

    fn tls_intermediate_certs(&self) -> &[Vec<u8>] {
        self.inner().tls_intermediate_certs()
    }

    fn deserialize_identity(&self, serialized: &[u8]) -> Result<Arc<dyn Identity>, MspError> {
        self.inner().deserialize_identity(serialized)
    }

    fn is_well_formed(&self, identity: &SerializedIdentity) -> Result<(), MspError> {
        self.inner().is_well_formed(identity)
    }

    fn validate(&self, identity: &dyn Identity) -> Result<(), MspError> {
        self.inner().validate(identity)
    }

    fn valid_until(&self, identity: &dyn Identity) -> Option<SystemTime> {
        self.inner().valid_until(identity)
    }

    fn evaluation(&self, kind: PrincipalKind) -> Evaluation {
        self.inner().evaluation(kind)
    }

    fn satisfies_scheme_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        self.inner().satisfies_scheme_principal(identity, principal)
    }

    fn satisfies_principal(
        &self,
        identity: &dyn Identity,
        principal: &Principal,
    ) -> Result<(), MspError> {
        self.inner().satisfies_principal(identity, principal)
    }

    fn default_signing_identity(&self) -> Result<Arc<dyn SigningIdentity>, MspError> {
        self.inner().default_signing_identity()
    }
}

/// Build one provider per configuration, ready for
/// [`MembershipManager::setup`](consortium_msp::MembershipManager::setup).
///
/// Fails on the first configuration that does not set up.
pub fn setup_providers<'a>(
    configs: impl IntoIterator<Item = &'a MspConfig>,
) -> Result<Vec<Arc<dyn Msp>>, MspError> {
    configs
        .into_iter()
        .map(|config| Ok(Arc::new(CredentialProvider::setup(config)?) as Arc<dyn Msp>))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CertificateMspConfig;
    use crate::helpers::{AnonymousIssuer, CertificateAuthority};
    use testresult::TestResult;

    #[test]
    fn it_dispatches_on_the_provider_type() -> TestResult {
        let ca = CertificateAuthority::root("ca.org1");
        let issuer = AnonymousIssuer::new("Org2");

        let providers = setup_providers(&[
            CertificateMspConfig::new("Org1", vec![ca.certificate().clone()])
                .to_msp_config(MspVersion::V1_3)?,
            issuer.config().to_msp_config(MspVersion::V1_0)?,
        ])?;

        assert_eq!(providers[0].provider_type(), ProviderType::Certificate);
        assert_eq!(providers[0].identifier(), "Org1");
        assert_eq!(providers[1].provider_type(), ProviderType::Anonymous);
        assert_eq!(providers[1].version(), MspVersion::V1_0);
        Ok(())
    }

    #[test]
    fn it_rejects_payloads_of_the_wrong_scheme() -> TestResult {
        let issuer = AnonymousIssuer::new("Org2");
        let mut config = issuer.config().to_msp_config(MspVersion::default())?;
        config.provider_type = ProviderType::Certificate;

        assert!(matches!(
            CredentialProvider::setup(&config),
            Err(MspError::MalformedConfig(_))
        ));
        assert!(matches!(
            CertificateMsp::setup(&MspConfig::new(ProviderType::Anonymous, vec![])),
            Err(MspError::MalformedConfig(_))
        ));
        Ok(())
    }
}
