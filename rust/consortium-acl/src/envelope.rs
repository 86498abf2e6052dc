//! Signed request envelopes.

use consortium_msp::{ChannelId, MspError, SigningIdentity};
use serde::{Deserialize, Serialize};

/// The `(signer, message, signature)` triple an access check evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedData {
    /// Serialized identity of the signer.
    #[serde(with = "serde_bytes")]
    pub signer: Vec<u8>,
    /// Signed bytes.
    #[serde(with = "serde_bytes")]
    pub message: Vec<u8>,
    /// Signature over `message`.
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

impl SignedData {
    /// Bundle a signed message.
    pub fn new(signer: Vec<u8>, message: Vec<u8>, signature: Vec<u8>) -> Self {
        Self {
            signer,
            message,
            signature,
        }
    }

    /// Sign `message` with `signer`.
    pub fn sign(signer: &dyn SigningIdentity, message: Vec<u8>) -> Result<Self, MspError> {
        Ok(Self {
            signer: signer.serialize(),
            signature: signer.sign(&message)?,
            message,
        })
    }
}

/// A request whose signer can be extracted for an access check.
pub trait RequestEnvelope: Send + Sync {
    /// The signed data the request carries.
    fn signed_data(&self) -> Result<SignedData, MspError>;
}

impl RequestEnvelope for SignedData {
    fn signed_data(&self) -> Result<SignedData, MspError> {
        Ok(self.clone())
    }
}

/// Header of a [`Proposal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalHeader {
    /// Channel the proposal is addressed to, if any.
    pub channel: Option<ChannelId>,
    /// Serialized identity of the proposal's creator.
    #[serde(with = "serde_bytes")]
    pub creator: Vec<u8>,
    /// Replay protection nonce.
    #[serde(with = "serde_bytes")]
    pub nonce: Vec<u8>,
}

/// A proposal submitted to a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Who proposes what, where.
    pub header: ProposalHeader,
    /// Opaque proposal payload.
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,
}

impl Proposal {
    /// Encode as DAG-CBOR.
    pub fn encode(&self) -> Result<Vec<u8>, MspError> {
        serde_ipld_dagcbor::to_vec(self)
            .map_err(|error| MspError::MalformedIdentity(error.to_string()))
    }
}

/// A DAG-CBOR encoded [`Proposal`] and its creator's signature over those
/// bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProposal {
    /// The encoded proposal.
    #[serde(with = "serde_bytes")]
    pub proposal_bytes: Vec<u8>,
    /// Signature of the creator over `proposal_bytes`.
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
}

impl SignedProposal {
    /// Encode and sign `proposal` with `signer`.
    pub fn sign(proposal: &Proposal, signer: &dyn SigningIdentity) -> Result<Self, MspError> {
        let proposal_bytes = proposal.encode()?;
        Ok(Self {
            signature: signer.sign(&proposal_bytes)?,
            proposal_bytes,
        })
    }

    /// Decode the proposal.
    pub fn proposal(&self) -> Result<Proposal, MspError> {
        serde_ipld_dagcbor::from_slice(&self.proposal_bytes)
            .map_err(|error| MspError::MalformedIdentity(format!("malformed proposal: {error}")))
    }
}

impl RequestEnvelope for SignedProposal {
    fn signed_data(&self) -> Result<SignedData, MspError> {
        Ok(SignedData {
            signer: self.proposal()?.header.creator,
            message: self.proposal_bytes.clone(),
            signature: self.signature.clone(),
        })
    }
}
