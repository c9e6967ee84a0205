use proptest::prelude::*;
use qv_governance::{vote_weight, GovernanceEngine, GovernanceError, InMemoryHoldings};
use qv_storage::MemoryStorage;
use qv_time::ManualClock;
use qv_types::{Address, VoteType};

const MINT: Address = Address::new([0x11; 32]);

fn tagged(tag: u8, i: usize) -> Address {
    let mut bytes = [tag; 32];
    bytes[31] = i as u8;
    Address::new(bytes)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Tallies equal the sum of accepted vote weights, per side, whatever
    /// mix of valid and invalid attempts is submitted.
    #[test]
    fn tallies_match_accepted_votes(
        ballots in prop::collection::vec((any::<u64>(), 0u8..4, any::<bool>()), 1..24)
    ) {
        let engine = GovernanceEngine::new(
            MemoryStorage::new(),
            ManualClock::new(1_000),
            InMemoryHoldings::new(),
        );
        let domain = engine
            .initialize_governance(Address::new([1u8; 32]), MINT, 100, 2)
            .unwrap();
        engine.register_voter(&domain.id, tagged(0xA0, 0)).unwrap();
        engine
            .create_proposal(&domain.id, tagged(0xA0, 0), [9u8; 32], "ipfs://prop")
            .unwrap();

        let mut yes = 0u64;
        let mut no = 0u64;
        for (i, (balance, raw_type, repeat)) in ballots.iter().enumerate() {
            let who = tagged(0xA0, i);
            let tokens = tagged(0xB0, i);
            if i > 0 {
                engine.register_voter(&domain.id, who).unwrap();
            }
            engine.oracle().open_account(tokens, who, MINT).unwrap();
            engine.oracle().mint(&tokens, *balance).unwrap();

            let weight = vote_weight(*balance);
            let accepted = match engine.cast_vote(&domain.id, 0, who, &tokens, *raw_type) {
                Ok(vote) => {
                    prop_assert_eq!(vote.voting_credits, weight);
                    match vote.vote_type {
                        VoteType::Yes => yes += weight,
                        VoteType::No => no += weight,
                    }
                    true
                }
                Err(GovernanceError::InvalidVoteType(t)) => {
                    prop_assert!(t > 1);
                    false
                }
                Err(GovernanceError::ZeroWeight { balance }) => {
                    prop_assert_eq!(balance, 0);
                    false
                }
                Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {other}"))),
            };

            if accepted && *repeat {
                let again = engine.cast_vote(&domain.id, 0, who, &tokens, 1);
                prop_assert!(again.is_err());
            }
        }

        let proposal = engine.proposal(&domain.id, 0).unwrap();
        prop_assert_eq!(proposal.yes_votes, yes);
        prop_assert_eq!(proposal.no_votes, no);
    }
}
