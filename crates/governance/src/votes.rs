//! Vote ledger: at most one weighted vote per (proposal, voter).
//!
//! Casting is split in two stages so the balance oracle is consulted only
//! for votes that could still be accepted:
//!
//! 1. [`check_preconditions`] runs the ordered checks that need no balance:
//!    the proposal must not be finalized, the vote type must decode, the
//!    voter must not have voted yet, and the voting window must still be
//!    open.
//! 2. [`cast`] validates the holding, weighs it and produces the new vote
//!    together with the updated proposal and voter records.

use crate::clock::check_voting_open;
use crate::error::{GovernanceError, Result};
use crate::holdings::Holding;
use crate::proposals::apply_tally;
use crate::registry::record_participation;
use crate::weighting::vote_weight;
use qv_types::{Address, GovernanceDomain, Proposal, UnixSeconds, Vote, VoteType, VoterRecord};

/// Records produced by an accepted vote, committed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastOutcome {
    pub vote: Vote,
    pub proposal: Proposal,
    pub voter: VoterRecord,
}

/// Checks that must pass, in this order, before any balance is read.
pub fn check_preconditions(
    proposal: &Proposal,
    raw_vote_type: u8,
    existing: Option<&Vote>,
    voter: Address,
    now: UnixSeconds,
) -> Result<VoteType> {
    if proposal.finalized {
        return Err(GovernanceError::ProposalFinalized(proposal.proposal_id));
    }
    let vote_type =
        VoteType::from_raw(raw_vote_type).ok_or(GovernanceError::InvalidVoteType(raw_vote_type))?;
    if existing.is_some() {
        return Err(GovernanceError::AlreadyVoted {
            proposal_id: proposal.proposal_id,
            voter,
        });
    }
    check_voting_open(proposal, now)?;
    Ok(vote_type)
}

/// Check that `holding` may back a vote by `caller` in `domain`.
pub fn check_holding(domain: &GovernanceDomain, holding: &Holding, caller: Address) -> Result<()> {
    if holding.owner != caller {
        return Err(GovernanceError::Unauthorized {
            owner: holding.owner,
            caller,
        });
    }
    if holding.resource != domain.governance_resource {
        return Err(GovernanceError::InvalidGovernanceResource {
            expected: domain.governance_resource,
            found: holding.resource,
        });
    }
    Ok(())
}

/// Weigh and record a vote that already passed [`check_preconditions`].
pub fn cast(
    domain: &GovernanceDomain,
    proposal: &Proposal,
    voter: &VoterRecord,
    vote_type: VoteType,
    holding: &Holding,
    now: UnixSeconds,
) -> Result<CastOutcome> {
    check_holding(domain, holding, voter.voter)?;

    let weight = vote_weight(holding.amount);
    if weight == 0 {
        return Err(GovernanceError::ZeroWeight {
            balance: holding.amount,
        });
    }

    let mut proposal = proposal.clone();
    apply_tally(&mut proposal, vote_type, weight)?;

    let mut voter = voter.clone();
    record_participation(&mut voter);

    Ok(CastOutcome {
        vote: Vote {
            proposal: proposal.key(),
            voter: voter.voter,
            vote_type,
            voting_credits: weight,
            cast_at: now,
        },
        proposal,
        voter,
    })
}
