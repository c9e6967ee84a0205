//! Record store for governance state.
//!
//! Records are addressed by deterministic composite keys and written through
//! [`WriteBatch`]es that apply atomically: an [`WriteOp::Insert`] requires its
//! key to be absent, an [`WriteOp::Update`] requires it to be present, and a
//! single violation aborts the whole batch.

use qv_types::{
    DomainId, GovernanceDomain, Proposal, ProposalKey, RecordKey, Vote, VoteKey, VoterKey,
    VoterRecord,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod memory;
pub mod sled_storage;

pub use memory::MemoryStorage;
pub use sled_storage::SledStorage;

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Record already exists: {0}")]
    KeyExists(RecordKey),
    #[error("Record not found: {0}")]
    MissingRecord(RecordKey),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Any storable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    Domain(GovernanceDomain),
    Voter(VoterRecord),
    Proposal(Proposal),
    Vote(Vote),
}

impl Record {
    pub fn key(&self) -> RecordKey {
        match self {
            Record::Domain(domain) => RecordKey::Domain(domain.id),
            Record::Voter(voter) => RecordKey::Voter(voter.key()),
            Record::Proposal(proposal) => RecordKey::Proposal(proposal.key()),
            Record::Vote(vote) => RecordKey::Vote(vote.key()),
        }
    }
}

impl From<GovernanceDomain> for Record {
    fn from(value: GovernanceDomain) -> Self {
        Record::Domain(value)
    }
}

impl From<VoterRecord> for Record {
    fn from(value: VoterRecord) -> Self {
        Record::Voter(value)
    }
}

impl From<Proposal> for Record {
    fn from(value: Proposal) -> Self {
        Record::Proposal(value)
    }
}

impl From<Vote> for Record {
    fn from(value: Vote) -> Self {
        Record::Vote(value)
    }
}

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Create the record; its key must not exist yet.
    Insert(Record),
    /// Overwrite the record; its key must already exist.
    Update(Record),
}

impl WriteOp {
    pub fn record(&self) -> &Record {
        match self {
            WriteOp::Insert(record) | WriteOp::Update(record) => record,
        }
    }

    pub fn key(&self) -> RecordKey {
        self.record().key()
    }

    pub fn into_record(self) -> Record {
        match self {
            WriteOp::Insert(record) | WriteOp::Update(record) => record,
        }
    }
}

/// Ordered set of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, record: impl Into<Record>) -> Self {
        self.ops.push(WriteOp::Insert(record.into()));
        self
    }

    pub fn update(mut self, record: impl Into<Record>) -> Self {
        self.ops.push(WriteOp::Update(record.into()));
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Abstract governance record store
pub trait GovernanceStore: Send + Sync {
    fn get_domain(&self, id: &DomainId) -> Result<Option<GovernanceDomain>>;
    fn get_voter(&self, key: &VoterKey) -> Result<Option<VoterRecord>>;
    fn get_proposal(&self, key: &ProposalKey) -> Result<Option<Proposal>>;
    fn get_vote(&self, key: &VoteKey) -> Result<Option<Vote>>;

    /// Proposals of a domain, ordered by id.
    fn list_proposals(&self, domain: &DomainId) -> Result<Vec<Proposal>>;
    /// Votes cast on a proposal, ordered by voter.
    fn list_votes(&self, proposal: &ProposalKey) -> Result<Vec<Vote>>;

    /// Apply every operation of the batch, or none of them.
    fn commit(&self, batch: WriteBatch) -> Result<()>;
}

impl<S: GovernanceStore + ?Sized> GovernanceStore for Arc<S> {
    fn get_domain(&self, id: &DomainId) -> Result<Option<GovernanceDomain>> {
        (**self).get_domain(id)
    }
    fn get_voter(&self, key: &VoterKey) -> Result<Option<VoterRecord>> {
        (**self).get_voter(key)
    }
    fn get_proposal(&self, key: &ProposalKey) -> Result<Option<Proposal>> {
        (**self).get_proposal(key)
    }
    fn get_vote(&self, key: &VoteKey) -> Result<Option<Vote>> {
        (**self).get_vote(key)
    }
    fn list_proposals(&self, domain: &DomainId) -> Result<Vec<Proposal>> {
        (**self).list_proposals(domain)
    }
    fn list_votes(&self, proposal: &ProposalKey) -> Result<Vec<Vote>> {
        (**self).list_votes(proposal)
    }
    fn commit(&self, batch: WriteBatch) -> Result<()> {
        (**self).commit(batch)
    }
}

impl<S: GovernanceStore + ?Sized> GovernanceStore for Box<S> {
    fn get_domain(&self, id: &DomainId) -> Result<Option<GovernanceDomain>> {
        (**self).get_domain(id)
    }
    fn get_voter(&self, key: &VoterKey) -> Result<Option<VoterRecord>> {
        (**self).get_voter(key)
    }
    fn get_proposal(&self, key: &ProposalKey) -> Result<Option<Proposal>> {
        (**self).get_proposal(key)
    }
    fn get_vote(&self, key: &VoteKey) -> Result<Option<Vote>> {
        (**self).get_vote(key)
    }
    fn list_proposals(&self, domain: &DomainId) -> Result<Vec<Proposal>> {
        (**self).list_proposals(domain)
    }
    fn list_votes(&self, proposal: &ProposalKey) -> Result<Vec<Vote>> {
        (**self).list_votes(proposal)
    }
    fn commit(&self, batch: WriteBatch) -> Result<()> {
        (**self).commit(batch)
    }
}
