use crate::{GovernanceStore, Record, Result, StorageError, WriteBatch, WriteOp};
use parking_lot::RwLock;
use qv_types::{
    Address, DomainId, GovernanceDomain, Proposal, ProposalKey, RecordKey, Vote, VoteKey,
    VoterKey, VoterRecord,
};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
struct MemoryState {
    domains: HashMap<DomainId, GovernanceDomain>,
    voters: HashMap<VoterKey, VoterRecord>,
    proposals: BTreeMap<ProposalKey, Proposal>,
    votes: BTreeMap<VoteKey, Vote>,
}

impl MemoryState {
    fn contains(&self, key: &RecordKey) -> bool {
        match key {
            RecordKey::Domain(id) => self.domains.contains_key(id),
            RecordKey::Voter(key) => self.voters.contains_key(key),
            RecordKey::Proposal(key) => self.proposals.contains_key(key),
            RecordKey::Vote(key) => self.votes.contains_key(key),
        }
    }

    fn put(&mut self, record: Record) {
        match record {
            Record::Domain(domain) => {
                self.domains.insert(domain.id, domain);
            }
            Record::Voter(voter) => {
                self.voters.insert(voter.key(), voter);
            }
            Record::Proposal(proposal) => {
                self.proposals.insert(proposal.key(), proposal);
            }
            Record::Vote(vote) => {
                self.votes.insert(vote.key(), vote);
            }
        }
    }
}

/// In-memory backend
///
/// A single lock guards all four record maps, so a batch is validated and
/// applied without any reader observing a partial state.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: RwLock<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GovernanceStore for MemoryStorage {
    fn get_domain(&self, id: &DomainId) -> Result<Option<GovernanceDomain>> {
        Ok(self.state.read().domains.get(id).cloned())
    }

    fn get_voter(&self, key: &VoterKey) -> Result<Option<VoterRecord>> {
        Ok(self.state.read().voters.get(key).cloned())
    }

    fn get_proposal(&self, key: &ProposalKey) -> Result<Option<Proposal>> {
        Ok(self.state.read().proposals.get(key).cloned())
    }

    fn get_vote(&self, key: &VoteKey) -> Result<Option<Vote>> {
        Ok(self.state.read().votes.get(key).cloned())
    }

    fn list_proposals(&self, domain: &DomainId) -> Result<Vec<Proposal>> {
        let start = ProposalKey::new(*domain, 0);
        let end = ProposalKey::new(*domain, u64::MAX);
        Ok(self
            .state
            .read()
            .proposals
            .range(start..=end)
            .map(|(_, proposal)| proposal.clone())
            .collect())
    }

    fn list_votes(&self, proposal: &ProposalKey) -> Result<Vec<Vote>> {
        let start = VoteKey::new(*proposal, Address::new([0u8; 32]));
        let end = VoteKey::new(*proposal, Address::new([0xFFu8; 32]));
        Ok(self
            .state
            .read()
            .votes
            .range(start..=end)
            .map(|(_, vote)| vote.clone())
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut state = self.state.write();

        // Keys written earlier in the same batch count as present.
        let mut staged: HashSet<RecordKey> = HashSet::new();
        for op in batch.ops() {
            let key = op.key();
            let exists = staged.contains(&key) || state.contains(&key);
            match op {
                WriteOp::Insert(_) if exists => return Err(StorageError::KeyExists(key)),
                WriteOp::Update(_) if !exists => return Err(StorageError::MissingRecord(key)),
                _ => {}
            }
            staged.insert(key);
        }

        let ops = batch.len();
        for op in batch.into_ops() {
            state.put(op.into_record());
        }
        tracing::trace!(ops, "memory batch committed");
        Ok(())
    }
}
