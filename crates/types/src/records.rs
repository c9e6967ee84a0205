use crate::address::{Address, DomainId, ResourceId};
use crate::keys::{ProposalId, ProposalKey, VoteKey, VoterKey};
use qv_time::UnixSeconds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length in bytes of a proposal's description URI.
pub const MAX_DESCRIPTION_URI_LEN: usize = 256;

/// Global configuration of one governance domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceDomain {
    pub id: DomainId,
    pub admin: Address,
    /// Mint whose holdings weigh votes.
    pub governance_resource: ResourceId,
    pub voice_credits_per_voter: u64,
    /// Seconds every proposal stays open for voting.
    pub voting_period: u64,
    /// Next proposal id; only ever increases, by one per proposal.
    pub proposal_count: u64,
}

/// Registration of a participant in a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub domain: DomainId,
    pub voter: Address,
    /// Allowance granted at registration. Tracked, not enforced as a cap.
    pub credits_remaining: u64,
    pub credits_spent: u64,
    pub proposals_voted_on: u64,
}

impl VoterRecord {
    pub fn key(&self) -> VoterKey {
        VoterKey::new(self.domain, self.voter)
    }
}

/// A proposal and its running tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub domain: DomainId,
    pub proposal_id: ProposalId,
    pub proposer: Address,
    /// Integrity anchor for the off-chain title text.
    #[serde(with = "hex::serde")]
    pub title_hash: [u8; 32],
    pub description_uri: String,
    pub creation_time: UnixSeconds,
    /// `creation_time + voting_period`, fixed at creation.
    pub end_time: UnixSeconds,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub finalized: bool,
}

impl Proposal {
    pub fn key(&self) -> ProposalKey {
        ProposalKey::new(self.domain, self.proposal_id)
    }

    pub fn is_voting_ended(&self, now: UnixSeconds) -> bool {
        now >= self.end_time
    }

    pub fn net_votes(&self) -> i128 {
        self.yes_votes as i128 - self.no_votes as i128
    }

    /// Outcome implied by the current tallies.
    ///
    /// Only meaningful once `finalized` is set; before that the tallies may
    /// still move.
    pub fn outcome(&self) -> ProposalOutcome {
        ProposalOutcome::from_net_votes(self.net_votes())
    }
}

/// Vote choice. The raw wire values are `No = 0`, `Yes = 1`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteType {
    No = 0,
    Yes = 1,
}

impl VoteType {
    /// Decode a raw vote type; anything other than 0 or 1 is rejected.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(VoteType::No),
            1 => Some(VoteType::Yes),
            _ => None,
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteType::No => f.write_str("AGAINST"),
            VoteType::Yes => f.write_str("FOR"),
        }
    }
}

/// One participant's weighted vote on one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal: ProposalKey,
    pub voter: Address,
    pub vote_type: VoteType,
    /// Weight derived from the voter's balance at cast time.
    pub voting_credits: u64,
    pub cast_at: UnixSeconds,
}

impl Vote {
    pub fn key(&self) -> VoteKey {
        VoteKey::new(self.proposal, self.voter)
    }
}

/// Result of a finalized proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalOutcome {
    Passed,
    Rejected,
    Tied,
}

impl ProposalOutcome {
    pub fn from_net_votes(net: i128) -> Self {
        match net {
            n if n > 0 => ProposalOutcome::Passed,
            n if n < 0 => ProposalOutcome::Rejected,
            _ => ProposalOutcome::Tied,
        }
    }
}

impl fmt::Display for ProposalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ProposalOutcome::Passed => "PASSED",
            ProposalOutcome::Rejected => "REJECTED",
            ProposalOutcome::Tied => "TIED",
        };
        f.write_str(value)
    }
}
