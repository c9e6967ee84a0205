//! Voting window of a proposal.
//!
//! The deadline is computed once, when the proposal opens, and stored as
//! `end_time`. Both gates below read that stored value: votes are accepted
//! strictly before it, finalization is allowed from it onwards.

use crate::error::{GovernanceError, Result};
use qv_types::{GovernanceDomain, Proposal, UnixSeconds};

/// Computes proposal deadlines for a given domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizationClock {
    voting_period: u64,
}

impl FinalizationClock {
    pub fn new(voting_period: u64) -> Self {
        Self { voting_period }
    }

    pub fn for_domain(domain: &GovernanceDomain) -> Self {
        Self::new(domain.voting_period)
    }

    /// First instant at which a proposal created at `creation_time` may close.
    pub fn deadline(&self, creation_time: UnixSeconds) -> Result<UnixSeconds> {
        creation_time
            .checked_add(self.voting_period)
            .ok_or(GovernanceError::TimestampOverflow)
    }
}

/// Fails once `proposal` has reached its deadline.
pub fn check_voting_open(proposal: &Proposal, now: UnixSeconds) -> Result<()> {
    if proposal.is_voting_ended(now) {
        return Err(GovernanceError::VotingPeriodEnded {
            proposal_id: proposal.proposal_id,
            ended_at: proposal.end_time,
            now,
        });
    }
    Ok(())
}

/// Fails unless `proposal` can be finalized at `now`.
pub fn check_finalizable(proposal: &Proposal, now: UnixSeconds) -> Result<()> {
    if proposal.finalized {
        return Err(GovernanceError::AlreadyFinalized(proposal.proposal_id));
    }
    if !proposal.is_voting_ended(now) {
        return Err(GovernanceError::VotingPeriodNotEnded {
            proposal_id: proposal.proposal_id,
            ends_at: proposal.end_time,
            now,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qv_types::{Address, DomainId};

    fn proposal(creation_time: UnixSeconds) -> Proposal {
        Proposal {
            domain: DomainId([1u8; 32]),
            proposal_id: 4,
            proposer: Address::new([2u8; 32]),
            title_hash: [3u8; 32],
            description_uri: "https://example.com/proposal".into(),
            creation_time,
            end_time: FinalizationClock::new(2).deadline(creation_time).unwrap(),
            yes_votes: 0,
            no_votes: 0,
            finalized: false,
        }
    }

    #[test]
    fn test_finalize_gate_opens_exactly_at_deadline() {
        let p = proposal(1_000);

        assert!(matches!(
            check_finalizable(&p, 1_000),
            Err(GovernanceError::VotingPeriodNotEnded { ends_at: 1_002, .. })
        ));
        assert!(check_finalizable(&p, 1_001).is_err());
        assert!(check_finalizable(&p, 1_002).is_ok());
        assert!(check_finalizable(&p, 5_000).is_ok());
    }

    #[test]
    fn test_vote_gate_closes_exactly_at_deadline() {
        let p = proposal(1_000);

        assert!(check_voting_open(&p, 1_000).is_ok());
        assert!(check_voting_open(&p, 1_001).is_ok());
        assert!(matches!(
            check_voting_open(&p, 1_002),
            Err(GovernanceError::VotingPeriodEnded {
                proposal_id: 4,
                ended_at: 1_002,
                now: 1_002,
            })
        ));
    }

    #[test]
    fn test_gates_follow_stored_end_time() {
        let mut p = proposal(1_000);
        p.end_time = 1_010;
        assert!(check_voting_open(&p, 1_005).is_ok());
        assert!(check_finalizable(&p, 1_005).is_err());
        assert!(check_finalizable(&p, 1_010).is_ok());
    }

    #[test]
    fn test_finalized_checked_first() {
        let mut p = proposal(1_000);
        p.finalized = true;
        assert!(matches!(
            check_finalizable(&p, 0),
            Err(GovernanceError::AlreadyFinalized(4))
        ));
    }

    #[test]
    fn test_deadline_overflow() {
        let clock = FinalizationClock::new(10);
        assert!(matches!(
            clock.deadline(u64::MAX - 5),
            Err(GovernanceError::TimestampOverflow)
        ));
    }
}
