//! Composite keys addressing ledger records.
//!
//! Each record type has exactly one key shape; the byte encoding is used by
//! persistent stores and keeps a domain's proposals contiguous and ordered by
//! id (big-endian).

use crate::address::{Address, DomainId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proposal sequence number, scoped to a domain.
pub type ProposalId = u64;

/// Key of a voter record: one per (domain, participant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoterKey {
    pub domain: DomainId,
    pub voter: Address,
}

impl VoterKey {
    pub fn new(domain: DomainId, voter: Address) -> Self {
        Self { domain, voter }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(self.domain.as_bytes());
        out.extend_from_slice(self.voter.as_bytes());
        out
    }
}

/// Key of a proposal: one per (domain, sequential id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalKey {
    pub domain: DomainId,
    pub proposal_id: ProposalId,
}

impl ProposalKey {
    pub fn new(domain: DomainId, proposal_id: ProposalId) -> Self {
        Self {
            domain,
            proposal_id,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(40);
        out.extend_from_slice(self.domain.as_bytes());
        out.extend_from_slice(&self.proposal_id.to_be_bytes());
        out
    }
}

/// Key of a vote: one per (proposal, participant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoteKey {
    pub proposal: ProposalKey,
    pub voter: Address,
}

impl VoteKey {
    pub fn new(proposal: ProposalKey, voter: Address) -> Self {
        Self { proposal, voter }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.proposal.to_bytes();
        out.extend_from_slice(self.voter.as_bytes());
        out
    }
}

/// Any record key, used for collision and missing-record reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKey {
    Domain(DomainId),
    Voter(VoterKey),
    Proposal(ProposalKey),
    Vote(VoteKey),
}

impl RecordKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RecordKey::Domain(id) => id.as_bytes().to_vec(),
            RecordKey::Voter(key) => key.to_bytes(),
            RecordKey::Proposal(key) => key.to_bytes(),
            RecordKey::Vote(key) => key.to_bytes(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Domain(id) => write!(f, "domain/{id}"),
            RecordKey::Voter(key) => write!(f, "voter/{}/{}", key.domain, key.voter),
            RecordKey::Proposal(key) => {
                write!(f, "proposal/{}/{}", key.domain, key.proposal_id)
            }
            RecordKey::Vote(key) => write!(
                f,
                "vote/{}/{}/{}",
                key.proposal.domain, key.proposal.proposal_id, key.voter
            ),
        }
    }
}
