//! End-to-end membership scenarios: providers built from configuration,
//! installed in a membership manager and exercised through serialized
//! identities only.

use std::sync::Arc;

use consortium_common::time;
use consortium_credentials::helpers::{
    AnonymousIssuer, CertificateAuthority, anonymous_identity, certificate_identity,
};
use consortium_credentials::{
    CachedMsp, CertificateMsp, CertificateMspConfig, CredentialProvider,
    OrganizationalUnitIdentifier, RevokedCertificate, setup_providers,
};
use consortium_msp::{
    MembershipManager, Msp, MspConfig, MspError, MspManager, MspRole, MspVersion, Principal,
};
use pretty_assertions::assert_eq;
use testresult::TestResult;

fn manager(configs: &[MspConfig]) -> Result<MembershipManager, MspError> {
    let manager = MembershipManager::new("ch1");
    manager.setup(setup_providers(configs)?)?;
    Ok(manager)
}

fn certificate_config(msp: &str, ca: &CertificateAuthority) -> Result<MspConfig, MspError> {
    CertificateMspConfig::new(msp, vec![ca.certificate().clone()]).to_msp_config(MspVersion::V1_3)
}

#[test]
fn it_grants_roles_only_within_the_issuing_organization() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let other = CertificateAuthority::root("ca.orgb");
    let manager = manager(&[
        certificate_config("OrgA", &root)?,
        certificate_config("OrgB", &other)?,
    ])?;

    let identity = manager.resolve_identity(&certificate_identity(
        "OrgA",
        &root.issue("peer0.orga", &["member"]),
    ))?;

    identity.satisfies_principal(&Principal::role("OrgA", MspRole::Member))?;
    assert!(matches!(
        identity.satisfies_principal(&Principal::role("OrgB", MspRole::Member)),
        Err(MspError::PrincipalMismatch(_))
    ));
    Ok(())
}

#[test]
fn it_validates_deterministically() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let stranger = CertificateAuthority::root("ca.stranger");
    let manager = manager(&[certificate_config("OrgA", &root)?])?;

    let trusted = manager.resolve_identity(&certificate_identity(
        "OrgA",
        &root.issue("peer0.orga", &[]),
    ))?;
    let untrusted = manager.resolve_identity(&certificate_identity(
        "OrgA",
        &stranger.issue("peer0.orga", &[]),
    ))?;

    for _ in 0..3 {
        assert_eq!(trusted.validate(), Ok(()));
        assert!(matches!(untrusted.validate(), Err(MspError::Untrusted(_))));
    }
    Ok(())
}

#[test]
fn it_reports_expired_and_revoked_certificates() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let expired = root.issue_expiring("old.orga", &[], 1);
    let revoked = root.issue("gone.orga", &[]);

    let mut config = CertificateMspConfig::new("OrgA", vec![root.certificate().clone()]);
    config.revocation_list = vec![RevokedCertificate {
        issuer: root.certificate().fingerprint()?,
        serial: revoked.body.serial,
    }];
    let manager = manager(&[config.to_msp_config(MspVersion::V1_3)?])?;

    assert!(matches!(
        manager
            .resolve_identity(&certificate_identity("OrgA", &expired))?
            .validate(),
        Err(MspError::Expired { .. })
    ));
    assert!(matches!(
        manager
            .resolve_identity(&certificate_identity("OrgA", &revoked))?
            .validate(),
        Err(MspError::Revoked { .. })
    ));
    Ok(())
}

#[test]
fn it_refuses_ca_certificates_as_identities() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let manager = manager(&[certificate_config("OrgA", &root)?])?;

    let identity =
        manager.resolve_identity(&certificate_identity("OrgA", &root.issue_ca("rogue.orga")))?;

    assert!(matches!(identity.validate(), Err(MspError::Untrusted(_))));
    Ok(())
}

#[test]
fn it_enforces_configured_organizational_units() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let mut config = CertificateMspConfig::new("OrgA", vec![root.certificate().clone()]);
    config.organizational_unit_identifiers = vec![OrganizationalUnitIdentifier {
        certifier: root.certificate().fingerprint()?,
        unit: "engineering".into(),
    }];
    let manager = manager(&[config.to_msp_config(MspVersion::V1_3)?])?;

    let inside = manager.resolve_identity(&certificate_identity(
        "OrgA",
        &root.issue("alice", &["engineering"]),
    ))?;
    let outside =
        manager.resolve_identity(&certificate_identity("OrgA", &root.issue("bob", &["sales"])))?;

    inside.validate()?;
    assert!(matches!(outside.validate(), Err(MspError::Untrusted(_))));
    Ok(())
}

#[test]
fn it_does_not_match_organizational_unit_near_misses() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let sibling = CertificateAuthority::root("ca2.orga");
    let config = CertificateMspConfig::new(
        "OrgA",
        vec![root.certificate().clone(), sibling.certificate().clone()],
    );
    let manager = manager(&[config.to_msp_config(MspVersion::V1_3)?])?;

    let identity = manager.resolve_identity(&certificate_identity(
        "OrgA",
        &root.issue("alice", &["engineering"]),
    ))?;

    identity.satisfies_principal(&Principal::organizational_unit(
        "OrgA",
        root.certificate().fingerprint()?,
        "engineering",
    ))?;
    assert!(matches!(
        identity.satisfies_principal(&Principal::organizational_unit(
            "OrgA",
            sibling.certificate().fingerprint()?,
            "engineering",
        )),
        Err(MspError::PrincipalMismatch(_))
    ));
    Ok(())
}

#[test]
fn it_recognizes_configured_admins() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let admin = root.issue("admin.orga", &[]);
    let mut config = CertificateMspConfig::new("OrgA", vec![root.certificate().clone()]);
    config.admins = vec![admin.clone()];
    let manager = manager(&[config.to_msp_config(MspVersion::V1_3)?])?;

    let admin_role = Principal::role("OrgA", MspRole::Admin);
    manager
        .resolve_identity(&certificate_identity("OrgA", &admin))?
        .satisfies_principal(&admin_role)?;
    manager
        .resolve_identity(&certificate_identity("OrgA", &root.issue("ops", &["admin"])))?
        .satisfies_principal(&admin_role)?;
    assert!(
        manager
            .resolve_identity(&certificate_identity("OrgA", &root.issue("peer0", &["peer"])))?
            .satisfies_principal(&admin_role)
            .is_err()
    );
    Ok(())
}

#[test]
fn it_signs_and_verifies_with_the_default_signing_identity() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let provider = CredentialProvider::setup(
        &root
            .config_with_signer("OrgA", &["peer"])
            .to_msp_config(MspVersion::V1_3)?,
    )?;

    let signer = provider.default_signing_identity()?;
    let signature = signer.sign(b"block 7")?;
    let public = provider.deserialize_identity(&signer.public_version().serialize())?;

    public.verify(b"block 7", &signature)?;
    assert!(matches!(
        public.verify(b"block 8", &signature),
        Err(MspError::SignatureInvalid(_))
    ));
    provider.satisfies_principal(public.as_ref(), &Principal::role("OrgA", MspRole::Peer))?;
    Ok(())
}

#[test]
fn it_reports_missing_signing_material() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let provider = CredentialProvider::setup(&certificate_config("OrgA", &root)?)?;

    assert!(matches!(
        provider.default_signing_identity(),
        Err(MspError::NotConfigured(_))
    ));
    Ok(())
}

#[test]
fn it_passes_tls_material_through() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let mut config = CertificateMspConfig::new("OrgA", vec![root.certificate().clone()]);
    config.tls_root_certs = vec![serde_bytes::ByteBuf::from(b"tls-root".to_vec())];
    let provider = CredentialProvider::setup(&config.to_msp_config(MspVersion::V1_3)?)?;

    assert_eq!(provider.tls_root_certs(), &[b"tls-root".to_vec()]);
    assert!(provider.tls_intermediate_certs().is_empty());
    Ok(())
}

#[test]
fn it_evaluates_anonymous_attributes_within_the_scheme() -> TestResult {
    let issuer = AnonymousIssuer::new("OrgC");
    let manager = manager(&[issuer.config().to_msp_config(MspVersion::V1_3)?])?;
    let (credential, _) = issuer.issue("unit1", MspRole::Peer, 11);

    let identity = manager.resolve_identity(&anonymous_identity("OrgC", &credential))?;
    let certifier = identity.identity().organizational_units()[0].certifier;

    identity.validate()?;
    identity.satisfies_principal(&Principal::role("OrgC", MspRole::Peer))?;
    identity.satisfies_principal(&Principal::role("OrgC", MspRole::Member))?;
    identity.satisfies_principal(&Principal::organizational_unit("OrgC", certifier, "unit1"))?;
    identity.satisfies_principal(&Principal::anonymity(true))?;

    for principal in [
        Principal::role("OrgC", MspRole::Admin),
        Principal::organizational_unit("OrgC", certifier, "unit2"),
        Principal::anonymity(false),
    ] {
        assert!(matches!(
            identity.satisfies_principal(&principal),
            Err(MspError::PrincipalMismatch(_))
        ));
    }
    Ok(())
}

#[test]
fn it_honors_anonymous_revocation_and_expiry() -> TestResult {
    let issuer = AnonymousIssuer::new("OrgC");
    let mut config = issuer.config();
    config.revoked_handles = vec![13];
    let manager = manager(&[config.to_msp_config(MspVersion::V1_3)?])?;

    let (revoked, _) = issuer.issue("unit1", MspRole::Member, 13);
    let (expired, _) = issuer.issue_with("unit1", MspRole::Member, 14, Some(1));
    let (current, _) = issuer.issue_with(
        "unit1",
        MspRole::Member,
        15,
        Some(time::to_unix_seconds(time::now()) + 3_600),
    );

    assert!(matches!(
        manager
            .resolve_identity(&anonymous_identity("OrgC", &revoked))?
            .validate(),
        Err(MspError::Revoked { .. })
    ));
    assert!(matches!(
        manager
            .resolve_identity(&anonymous_identity("OrgC", &expired))?
            .validate(),
        Err(MspError::Expired { .. })
    ));
    manager
        .resolve_identity(&anonymous_identity("OrgC", &current))?
        .validate()?;
    Ok(())
}

#[test]
fn it_refuses_anonymity_principals_on_legacy_providers() -> TestResult {
    let issuer = AnonymousIssuer::new("OrgC");
    let manager = manager(&[issuer.config().to_msp_config(MspVersion::V1_0)?])?;
    let (credential, _) = issuer.issue("unit1", MspRole::Member, 1);

    let identity = manager.resolve_identity(&anonymous_identity("OrgC", &credential))?;

    identity.satisfies_principal(&Principal::role("OrgC", MspRole::Member))?;
    identity.satisfies_principal(&Principal::any([Principal::role("OrgC", MspRole::Member)]))?;
    assert!(identity.satisfies_principal(&Principal::anonymity(true)).is_err());
    assert!(
        identity
            .satisfies_principal(&Principal::any([Principal::anonymity(true)]))
            .is_err()
    );
    Ok(())
}

#[test]
fn it_routes_mixed_schemes_by_organization() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let issuer = AnonymousIssuer::new("OrgC");
    let manager = manager(&[
        certificate_config("OrgA", &root)?,
        issuer.config().to_msp_config(MspVersion::V1_3)?,
    ])?;
    let (credential, _) = issuer.issue("unit1", MspRole::Member, 1);

    let certificate = manager.deserialize_identity(&certificate_identity(
        "OrgA",
        &root.issue("peer0", &[]),
    ))?;
    let anonymous = manager.deserialize_identity(&anonymous_identity("OrgC", &credential))?;

    assert!(!certificate.anonymous());
    assert!(anonymous.anonymous());

    // A certificate presented under the anonymous organization is a decode
    // failure of that provider, not a cross-scheme interpretation.
    assert!(matches!(
        manager.deserialize_identity(&certificate_identity("OrgC", &root.issue("peer1", &[]))),
        Err(MspError::MalformedIdentity(_))
    ));
    assert_eq!(
        manager
            .deserialize_identity(&certificate_identity("OrgZ", &root.issue("peer2", &[])))
            .unwrap_err(),
        MspError::unknown_issuer("OrgZ")
    );
    Ok(())
}

#[test]
fn it_serves_cached_providers_from_a_manager() -> TestResult {
    let root = CertificateAuthority::root("ca.orga");
    let provider = CertificateMsp::setup(&certificate_config("OrgA", &root)?)?;
    let manager = MembershipManager::new("local");
    manager.setup([Arc::new(CachedMsp::with_default_capacity(provider)?) as Arc<dyn Msp>])?;

    let serialized = certificate_identity("OrgA", &root.issue("peer0", &["peer"]));
    for _ in 0..3 {
        manager
            .resolve_identity(&serialized)?
            .satisfies_principal(&Principal::role("OrgA", MspRole::Peer))?;
    }
    Ok(())
}
