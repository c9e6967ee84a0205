use qv_governance::{GovernanceEngine, GovernanceError, InMemoryHoldings};
use qv_storage::MemoryStorage;
use qv_time::ManualClock;
use qv_types::{Address, DomainId, ProposalOutcome, VoteType};

type Engine = GovernanceEngine<MemoryStorage, ManualClock, InMemoryHoldings>;

const MINT: Address = Address::new([0x11; 32]);

fn addr(tag: u8) -> Address {
    Address::new([tag; 32])
}

struct Scenario {
    engine: Engine,
    domain: DomainId,
    admin: Address,
    alice: Address,
    bob: Address,
    alice_tokens: Address,
    bob_tokens: Address,
}

fn scenario() -> Scenario {
    let engine = GovernanceEngine::new(
        MemoryStorage::new(),
        ManualClock::new(1_700_000_000),
        InMemoryHoldings::new(),
    );
    let admin = addr(1);
    let alice = addr(2);
    let bob = addr(3);
    let alice_tokens = addr(0x22);
    let bob_tokens = addr(0x33);

    let holdings = engine.oracle();
    holdings.open_account(alice_tokens, alice, MINT).unwrap();
    holdings.open_account(bob_tokens, bob, MINT).unwrap();
    holdings.mint(&alice_tokens, 100_000_000).unwrap();
    holdings.mint(&bob_tokens, 49_000_000).unwrap();

    let domain = engine.initialize_governance(admin, MINT, 100, 2).unwrap();
    Scenario {
        engine,
        domain: domain.id,
        admin,
        alice,
        bob,
        alice_tokens,
        bob_tokens,
    }
}

#[test]
fn full_proposal_lifecycle() {
    let s = scenario();
    let engine = &s.engine;

    let domain = engine.domain(&s.domain).unwrap();
    assert_eq!(domain.admin, s.admin);
    assert_eq!(domain.governance_resource, MINT);
    assert_eq!(domain.voice_credits_per_voter, 100);
    assert_eq!(domain.voting_period, 2);
    assert_eq!(domain.proposal_count, 0);

    let alice = engine.register_voter(&s.domain, s.alice).unwrap();
    assert_eq!(alice.credits_remaining, 100);
    engine.register_voter(&s.domain, s.bob).unwrap();

    let title = *blake3::hash(b"Increase treasury allocation").as_bytes();
    let proposal = engine
        .create_proposal(&s.domain, s.alice, title, "https://example.com/proposal/1")
        .unwrap();
    assert_eq!(proposal.proposal_id, 0);
    assert_eq!((proposal.yes_votes, proposal.no_votes), (0, 0));
    assert!(!proposal.finalized);
    assert_eq!(engine.domain(&s.domain).unwrap().proposal_count, 1);

    let yes = engine
        .cast_vote(&s.domain, 0, s.alice, &s.alice_tokens, 1)
        .unwrap();
    assert_eq!(yes.vote_type, VoteType::Yes);
    assert_eq!(yes.voting_credits, 10_000);
    assert_eq!(engine.proposal(&s.domain, 0).unwrap().yes_votes, 10_000);

    let no = engine
        .cast_vote(&s.domain, 0, s.bob, &s.bob_tokens, 0)
        .unwrap();
    assert_eq!(no.voting_credits, 7_000);

    let tallied = engine.proposal(&s.domain, 0).unwrap();
    assert_eq!((tallied.yes_votes, tallied.no_votes), (10_000, 7_000));

    // allowance is tracked, not spent
    let alice = engine.voter(&s.domain, &s.alice).unwrap().unwrap();
    assert_eq!(alice.credits_remaining, 100);
    assert_eq!(alice.proposals_voted_on, 1);

    // voting period of 2 seconds has not elapsed yet
    let err = engine.finalize_proposal(&s.domain, 0, s.admin).unwrap_err();
    assert!(matches!(err, GovernanceError::VotingPeriodNotEnded { .. }));
    assert!(!engine.proposal(&s.domain, 0).unwrap().finalized);

    engine.clock().advance(3);
    let done = engine.finalize_proposal(&s.domain, 0, s.admin).unwrap();
    assert!(done.proposal.finalized);
    assert_eq!(done.outcome, ProposalOutcome::Passed);
    assert_eq!(done.proposal.net_votes(), 3_000);

    let again = engine.finalize_proposal(&s.domain, 0, s.admin).unwrap_err();
    assert!(matches!(again, GovernanceError::AlreadyFinalized(0)));
}

#[test]
fn second_vote_by_same_voter_rejected() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.alice).unwrap();
    engine
        .create_proposal(&s.domain, s.alice, [9u8; 32], "ipfs://proposal")
        .unwrap();

    engine
        .cast_vote(&s.domain, 0, s.alice, &s.alice_tokens, 1)
        .unwrap();
    let err = engine
        .cast_vote(&s.domain, 0, s.alice, &s.alice_tokens, 0)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::AlreadyVoted { proposal_id: 0, voter } if voter == s.alice));

    let proposal = engine.proposal(&s.domain, 0).unwrap();
    assert_eq!((proposal.yes_votes, proposal.no_votes), (10_000, 0));
    assert_eq!(engine.votes(&s.domain, 0).unwrap().len(), 1);
}

#[test]
fn votes_rejected_once_deadline_passes() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.alice).unwrap();
    engine.register_voter(&s.domain, s.bob).unwrap();
    let proposal = engine
        .create_proposal(&s.domain, s.alice, [9u8; 32], "ipfs://proposal")
        .unwrap();

    engine.clock().advance(1);
    engine
        .cast_vote(&s.domain, 0, s.alice, &s.alice_tokens, 0)
        .unwrap();
    let reads = engine.oracle().read_count();

    engine.clock().advance(1);
    let err = engine
        .cast_vote(&s.domain, 0, s.bob, &s.bob_tokens, 1)
        .unwrap_err();
    assert!(matches!(
        err,
        GovernanceError::VotingPeriodEnded { proposal_id: 0, ended_at, now }
            if ended_at == proposal.end_time && now == proposal.end_time
    ));
    assert!(engine.vote(&s.domain, 0, &s.bob).unwrap().is_none());
    assert_eq!(engine.oracle().read_count(), reads);

    let tallied = engine.proposal(&s.domain, 0).unwrap();
    assert_eq!((tallied.yes_votes, tallied.no_votes), (0, 10_000));
    assert_eq!(
        engine.voter(&s.domain, &s.bob).unwrap().unwrap().proposals_voted_on,
        0
    );
}

#[test]
fn votes_rejected_once_finalized() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.alice).unwrap();
    engine.register_voter(&s.domain, s.bob).unwrap();
    engine
        .create_proposal(&s.domain, s.alice, [9u8; 32], "ipfs://proposal")
        .unwrap();

    engine
        .cast_vote(&s.domain, 0, s.alice, &s.alice_tokens, 0)
        .unwrap();
    engine.clock().advance(2);
    let done = engine.finalize_proposal(&s.domain, 0, s.bob).unwrap();
    assert_eq!(done.outcome, ProposalOutcome::Rejected);

    // finalized is reported ahead of the closed window
    let err = engine
        .cast_vote(&s.domain, 0, s.bob, &s.bob_tokens, 1)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::ProposalFinalized(0)));
    assert!(engine.vote(&s.domain, 0, &s.bob).unwrap().is_none());
}

#[test]
fn duplicate_registration_and_domain_rejected() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.alice).unwrap();
    assert!(matches!(
        engine.register_voter(&s.domain, s.alice),
        Err(GovernanceError::AlreadyRegistered { .. })
    ));
    assert!(matches!(
        engine.initialize_governance(s.admin, MINT, 1, 1),
        Err(GovernanceError::AlreadyInitialized(_))
    ));

    // another admin gets an independent domain
    let other = engine.initialize_governance(addr(9), MINT, 5, 10).unwrap();
    assert_ne!(other.id, s.domain);
    assert_eq!(engine.domain_of(&addr(9)).unwrap(), Some(other));
}

#[test]
fn proposal_ids_are_sequential_and_scoped() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.alice).unwrap();

    for n in 0..3u64 {
        let p = engine
            .create_proposal(&s.domain, s.alice, [n as u8 + 1; 32], format!("ipfs://{n}"))
            .unwrap();
        assert_eq!(p.proposal_id, n);
    }
    let rejected = engine.create_proposal(&s.domain, s.alice, [0u8; 32], "ipfs://x");
    assert!(matches!(rejected, Err(GovernanceError::EmptyTitleHash)));

    let ids: Vec<u64> = engine
        .proposals(&s.domain)
        .unwrap()
        .iter()
        .map(|p| p.proposal_id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(engine.domain(&s.domain).unwrap().proposal_count, 3);
}

#[test]
fn holding_must_match_caller_and_resource() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.alice).unwrap();
    engine.register_voter(&s.domain, s.bob).unwrap();
    engine
        .create_proposal(&s.domain, s.alice, [9u8; 32], "ipfs://proposal")
        .unwrap();

    // bob presents alice's account
    let err = engine
        .cast_vote(&s.domain, 0, s.bob, &s.alice_tokens, 1)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::Unauthorized { .. }));

    let other_mint = addr(0x44);
    engine
        .oracle()
        .open_account(addr(0x55), s.bob, other_mint)
        .unwrap();
    engine.oracle().mint(&addr(0x55), 1_000_000).unwrap();
    let err = engine
        .cast_vote(&s.domain, 0, s.bob, &addr(0x55), 1)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::InvalidGovernanceResource { .. }));

    // rejected attempts do not consume bob's vote
    let vote = engine
        .cast_vote(&s.domain, 0, s.bob, &s.bob_tokens, 1)
        .unwrap();
    assert_eq!(vote.voting_credits, 7_000);
}

#[test]
fn zero_balance_does_not_consume_vote() {
    let s = scenario();
    let engine = &s.engine;
    engine.register_voter(&s.domain, s.bob).unwrap();
    engine
        .create_proposal(&s.domain, s.bob, [9u8; 32], "ipfs://proposal")
        .unwrap();

    engine.oracle().burn(&s.bob_tokens, 49_000_000).unwrap();
    let err = engine
        .cast_vote(&s.domain, 0, s.bob, &s.bob_tokens, 1)
        .unwrap_err();
    assert!(matches!(err, GovernanceError::ZeroWeight { balance: 0 }));

    engine.oracle().mint(&s.bob_tokens, 4).unwrap();
    let vote = engine
        .cast_vote(&s.domain, 0, s.bob, &s.bob_tokens, 1)
        .unwrap();
    assert_eq!(vote.voting_credits, 2);
}
