//! Error types for the Governance engine

use crate::holdings::HoldingError;
use qv_storage::StorageError;
use qv_types::{Address, DomainId, ProposalId, ResourceId, UnixSeconds};
use thiserror::Error;

/// Every way a governance operation can be rejected.
///
/// A rejected operation has no side effects.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// A domain already exists for this admin
    #[error("Governance domain already initialized: {0}")]
    AlreadyInitialized(DomainId),

    #[error("Voice credits per voter must be at least 1")]
    InvalidCreditAllocation,

    #[error("Voting period must be greater than zero")]
    InvalidVotingPeriod,

    #[error("Governance domain not found: {0}")]
    DomainNotFound(DomainId),

    #[error("Voter is already registered: {voter}")]
    AlreadyRegistered { voter: Address },

    #[error("Not a registered voter in this domain: {voter}")]
    NotRegistered { voter: Address },

    #[error("Proposal title hash cannot be empty")]
    EmptyTitleHash,

    #[error("Description URI cannot be empty")]
    EmptyDescriptionUri,

    #[error("Description URI too long: {len} bytes (max {max})")]
    UriTooLong { len: usize, max: usize },

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    /// Vote attempted on a closed proposal
    #[error("Proposal {0} is finalized and no longer accepts votes")]
    ProposalFinalized(ProposalId),

    #[error("Invalid vote type {0} (must be 0 or 1)")]
    InvalidVoteType(u8),

    #[error("Voter {voter} has already voted on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: Address,
    },

    #[error("Balance {balance} yields no voting weight")]
    ZeroWeight { balance: u64 },

    #[error("Unauthorized: holding account belongs to {owner}, not {caller}")]
    Unauthorized { owner: Address, caller: Address },

    #[error("Holding is for resource {found}, domain votes with {expected}")]
    InvalidGovernanceResource {
        expected: ResourceId,
        found: ResourceId,
    },

    #[error("Voting period of proposal {proposal_id} ends at {ends_at}, now {now}")]
    VotingPeriodNotEnded {
        proposal_id: ProposalId,
        ends_at: UnixSeconds,
        now: UnixSeconds,
    },

    #[error("Voting on proposal {proposal_id} closed at {ended_at} (now {now})")]
    VotingPeriodEnded {
        proposal_id: ProposalId,
        ended_at: UnixSeconds,
        now: UnixSeconds,
    },

    #[error("Proposal {0} has already been finalized")]
    AlreadyFinalized(ProposalId),

    #[error("Arithmetic overflow in vote tally")]
    TallyOverflow,

    #[error("Arithmetic overflow computing the voting deadline")]
    TimestampOverflow,

    #[error("Proposal counter exhausted")]
    ProposalCountOverflow,

    #[error("Balance oracle error: {0}")]
    Holding(#[from] HoldingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for Governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;
