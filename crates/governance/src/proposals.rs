//! Proposal ledger: creation, tally updates and closing.

use crate::clock::{check_finalizable, FinalizationClock};
use crate::domain::allocate_proposal_id;
use crate::error::{GovernanceError, Result};
use qv_types::{
    GovernanceDomain, Proposal, ProposalOutcome, UnixSeconds, VoteType, VoterRecord,
};

/// Proposal content supplied by the proposer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub title_hash: [u8; 32],
    pub description_uri: String,
}

impl ProposalDraft {
    pub fn new(title_hash: [u8; 32], description_uri: impl Into<String>) -> Self {
        Self {
            title_hash,
            description_uri: description_uri.into(),
        }
    }

    pub fn validate(&self, max_uri_len: usize) -> Result<()> {
        if self.title_hash == [0u8; 32] {
            return Err(GovernanceError::EmptyTitleHash);
        }
        if self.description_uri.is_empty() {
            return Err(GovernanceError::EmptyDescriptionUri);
        }
        let len = self.description_uri.len();
        if len > max_uri_len {
            return Err(GovernanceError::UriTooLong {
                len,
                max: max_uri_len,
            });
        }
        Ok(())
    }
}

/// Open a proposal in `domain`, consuming the next id.
///
/// `domain` is only advanced when every check passes.
pub fn open(
    domain: &mut GovernanceDomain,
    proposer: &VoterRecord,
    draft: ProposalDraft,
    now: UnixSeconds,
    max_uri_len: usize,
) -> Result<Proposal> {
    draft.validate(max_uri_len)?;
    let end_time = FinalizationClock::for_domain(domain).deadline(now)?;

    let mut next = domain.clone();
    let proposal_id = allocate_proposal_id(&mut next)?;
    *domain = next;

    Ok(Proposal {
        domain: domain.id,
        proposal_id,
        proposer: proposer.voter,
        title_hash: draft.title_hash,
        description_uri: draft.description_uri,
        creation_time: now,
        end_time,
        yes_votes: 0,
        no_votes: 0,
        finalized: false,
    })
}

/// Add `weight` to the tally matching `vote_type`.
pub fn apply_tally(proposal: &mut Proposal, vote_type: VoteType, weight: u64) -> Result<()> {
    let tally = match vote_type {
        VoteType::Yes => &mut proposal.yes_votes,
        VoteType::No => &mut proposal.no_votes,
    };
    *tally = tally
        .checked_add(weight)
        .ok_or(GovernanceError::TallyOverflow)?;
    Ok(())
}

/// Close `proposal` if its voting period has elapsed.
pub fn finalize(proposal: &mut Proposal, now: UnixSeconds) -> Result<ProposalOutcome> {
    check_finalizable(proposal, now)?;
    proposal.finalized = true;
    Ok(proposal.outcome())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qv_types::{Address, DomainId, MAX_DESCRIPTION_URI_LEN};

    fn domain() -> GovernanceDomain {
        let admin = Address::new([1u8; 32]);
        GovernanceDomain {
            id: DomainId::derive(&admin),
            admin,
            governance_resource: Address::new([0xAA; 32]),
            voice_credits_per_voter: 100,
            voting_period: 2,
            proposal_count: 0,
        }
    }

    fn proposer(domain: &GovernanceDomain) -> VoterRecord {
        crate::registry::register(domain, Address::new([2u8; 32]))
    }

    #[test]
    fn test_open_assigns_ids_and_deadline() {
        let mut d = domain();
        let who = proposer(&d);
        let first = open(
            &mut d,
            &who,
            ProposalDraft::new([9u8; 32], "https://example.com/proposal"),
            1_000,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap();
        let second = open(
            &mut d,
            &who,
            ProposalDraft::new([9u8; 32], "ipfs://second"),
            1_001,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap();

        assert_eq!(first.proposal_id, 0);
        assert_eq!(first.end_time, 1_002);
        assert_eq!(first.proposer, who.voter);
        assert_eq!(second.proposal_id, 1);
        assert_eq!(d.proposal_count, 2);
    }

    #[test]
    fn test_uri_length_boundary() {
        let at_limit = ProposalDraft::new([1u8; 32], "a".repeat(MAX_DESCRIPTION_URI_LEN));
        assert!(at_limit.validate(MAX_DESCRIPTION_URI_LEN).is_ok());

        let over = ProposalDraft::new([1u8; 32], "a".repeat(MAX_DESCRIPTION_URI_LEN + 1));
        assert!(matches!(
            over.validate(MAX_DESCRIPTION_URI_LEN),
            Err(GovernanceError::UriTooLong { len: 257, max: 256 })
        ));
    }

    #[test]
    fn test_rejected_draft_does_not_consume_id() {
        let mut d = domain();
        let who = proposer(&d);
        let err = open(
            &mut d,
            &who,
            ProposalDraft::new([0u8; 32], "https://example.com"),
            1_000,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::EmptyTitleHash));

        let err = open(
            &mut d,
            &who,
            ProposalDraft::new([1u8; 32], ""),
            1_000,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::EmptyDescriptionUri));
        assert_eq!(d.proposal_count, 0);
    }

    #[test]
    fn test_deadline_overflow_rejected() {
        let mut d = domain();
        let who = proposer(&d);
        let err = open(
            &mut d,
            &who,
            ProposalDraft::new([1u8; 32], "ipfs://x"),
            u64::MAX,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap_err();
        assert!(matches!(err, GovernanceError::TimestampOverflow));
        assert_eq!(d.proposal_count, 0);
    }

    #[test]
    fn test_tally_overflow_is_an_error() {
        let mut d = domain();
        let who = proposer(&d);
        let mut p = open(
            &mut d,
            &who,
            ProposalDraft::new([1u8; 32], "ipfs://x"),
            0,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap();
        p.yes_votes = u64::MAX;
        assert!(matches!(
            apply_tally(&mut p, VoteType::Yes, 1),
            Err(GovernanceError::TallyOverflow)
        ));
        assert_eq!(p.yes_votes, u64::MAX);

        apply_tally(&mut p, VoteType::No, 7_000).unwrap();
        assert_eq!(p.no_votes, 7_000);
    }

    #[test]
    fn test_finalize_sets_flag_once() {
        let mut d = domain();
        let who = proposer(&d);
        let mut p = open(
            &mut d,
            &who,
            ProposalDraft::new([1u8; 32], "ipfs://x"),
            100,
            MAX_DESCRIPTION_URI_LEN,
        )
        .unwrap();
        apply_tally(&mut p, VoteType::Yes, 10_000).unwrap();
        apply_tally(&mut p, VoteType::No, 7_000).unwrap();

        assert!(finalize(&mut p, 101).is_err());
        assert!(!p.finalized);

        assert_eq!(finalize(&mut p, 102).unwrap(), ProposalOutcome::Passed);
        assert!(p.finalized);
        assert!(matches!(
            finalize(&mut p, 200),
            Err(GovernanceError::AlreadyFinalized(0))
        ));
    }
}
