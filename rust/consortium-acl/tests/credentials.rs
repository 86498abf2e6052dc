//! Access checks and security advice over real certificate providers.

use std::sync::Arc;

use consortium_acl::resources::{CHANNEL_CREATE, PEER_PROPOSE};
use consortium_acl::{
    AclError, AclProvider, AclTable, MembershipAdvisor, Proposal, ProposalHeader,
    ResourceAclProvider, SecurityAdvisor, SignedData, SignedProposal, StaticChannelConfig,
};
use consortium_credentials::helpers::{CertificateAuthority, certificate_identity};
use consortium_credentials::{CertificateMspConfig, setup_providers};
use consortium_msp::{
    ChannelId, ManagerRegistry, MembershipManager, MspConfig, MspError, MspManager, MspRole,
    MspVersion, Principal, SigningIdentity,
};
use ed25519_dalek::{Signature, Signer};
use pretty_assertions::assert_eq;
use testresult::TestResult;

struct Network {
    org_a: CertificateAuthority,
    org_b: CertificateAuthority,
    registry: Arc<ManagerRegistry>,
    signer: Arc<dyn SigningIdentity>,
}

fn manager(scope: &str, configs: &[MspConfig]) -> Result<Arc<MembershipManager>, MspError> {
    let manager = MembershipManager::new(scope);
    manager.setup(setup_providers(configs)?)?;
    Ok(Arc::new(manager))
}

/// OrgA runs this node; channel `ch1` has OrgA and OrgB as members.
fn network() -> Result<Network, MspError> {
    let org_a = CertificateAuthority::root("ca.orga");
    let org_b = CertificateAuthority::root("ca.orgb");

    let org_a_config = org_a
        .config_with_signer("OrgA", &["peer"])
        .to_msp_config(MspVersion::V1_3)?;
    let org_b_config = CertificateMspConfig::new("OrgB", vec![org_b.certificate().clone()])
        .to_msp_config(MspVersion::V1_3)?;

    let local = manager("local", std::slice::from_ref(&org_a_config))?;
    let signer = local
        .msps()?
        .get("OrgA")
        .ok_or_else(|| MspError::unknown_issuer("OrgA"))?
        .default_signing_identity()?;

    let registry = Arc::new(ManagerRegistry::new(local));
    registry.install(
        ChannelId::from("ch1"),
        manager("ch1", &[org_a_config, org_b_config])?,
    );

    Ok(Network {
        org_a,
        org_b,
        registry,
        signer,
    })
}

fn admins() -> Principal {
    Principal::any([
        Principal::role("OrgA", MspRole::Admin),
        Principal::role("OrgB", MspRole::Admin),
    ])
}

#[test]
fn it_grants_proposals_and_denies_channel_creation_to_a_peer() -> TestResult {
    let network = network()?;
    let acl = ResourceAclProvider::new(
        network.registry.clone(),
        Arc::new(StaticChannelConfig::new()),
        AclTable::new()
            .with_acl(PEER_PROPOSE, Principal::role("OrgA", MspRole::Peer))
            .with_acl(CHANNEL_CREATE, admins()),
        AclTable::new(),
    );
    let ch1 = ChannelId::from("ch1");

    let proposal = SignedProposal::sign(
        &Proposal {
            header: ProposalHeader {
                channel: Some(ch1.clone()),
                creator: network.signer.public_version().serialize(),
                nonce: vec![7; 24],
            },
            payload: b"invoke transfer".to_vec(),
        },
        network.signer.as_ref(),
    )?;
    acl.check_acl(PEER_PROPOSE, &ch1, &proposal)?;

    let request = SignedData::sign(network.signer.as_ref(), b"create ch2".to_vec())?;
    assert_eq!(
        acl.check_acl(CHANNEL_CREATE, &ch1, &request),
        Err(AclError::AccessDenied)
    );
    Ok(())
}

#[test]
fn it_denies_tampered_requests_and_foreign_signers() -> TestResult {
    let network = network()?;
    let acl = ResourceAclProvider::new(
        network.registry.clone(),
        Arc::new(StaticChannelConfig::new()),
        AclTable::new().with_acl(PEER_PROPOSE, Principal::role("OrgA", MspRole::Member)),
        AclTable::new().with_acl(PEER_PROPOSE, Principal::role("OrgA", MspRole::Member)),
    );
    let ch1 = ChannelId::from("ch1");

    let mut request = SignedData::sign(network.signer.as_ref(), b"proposal".to_vec())?;
    acl.check_acl(PEER_PROPOSE, &ch1, &request)?;
    acl.check_acl_no_channel(PEER_PROPOSE, &request)?;

    request.message = b"proposal, amended".to_vec();
    assert_eq!(
        acl.check_acl(PEER_PROPOSE, &ch1, &request),
        Err(AclError::AccessDenied)
    );

    // OrgB is a channel member but unknown to the local manager.
    let (certificate, key) = network.org_b.enroll("peer0.orgb", &[]);
    let signature: Signature = key.sign(b"proposal");
    let foreign = SignedData::new(
        certificate_identity("OrgB", &certificate),
        b"proposal".to_vec(),
        signature.to_bytes().to_vec(),
    );
    assert_eq!(
        acl.check_acl(PEER_PROPOSE, &ch1, &foreign),
        Err(AclError::AccessDenied)
    );
    assert_eq!(
        acl.check_acl_no_channel(PEER_PROPOSE, &foreign),
        Err(AclError::AccessDenied)
    );
    Ok(())
}

#[test]
fn it_names_the_organization_of_known_peers() -> TestResult {
    let network = network()?;
    let advisor = MembershipAdvisor::new(network.registry.clone());

    let local_peer = certificate_identity("OrgA", &network.org_a.issue("peer1.orga", &["peer"]));
    let channel_peer = certificate_identity("OrgB", &network.org_b.issue("peer0.orgb", &["peer"]));

    assert_eq!(advisor.org_by_identity(&local_peer), Some("OrgA".to_string()));
    assert_eq!(advisor.org_by_identity(&channel_peer), Some("OrgB".to_string()));
    assert_eq!(advisor.org_by_identity(b"not an identity"), None);
    assert_eq!(
        advisor.org_by_identity(&certificate_identity(
            "OrgZ",
            &network.org_b.issue("peer0.orgz", &[])
        )),
        None
    );

    network.registry.remove(&ChannelId::from("ch1"));
    assert_eq!(advisor.org_by_identity(&channel_peer), None);
    Ok(())
}
