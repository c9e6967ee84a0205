use crate::{GovernanceStore, Record, Result, StorageError, WriteBatch, WriteOp};
use qv_types::{
    DomainId, GovernanceDomain, Proposal, ProposalKey, RecordKey, Vote, VoteKey, VoterKey,
    VoterRecord,
};
use serde::de::DeserializeOwned;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use sled::{Db, Tree};
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq)]
enum TreeKind {
    Domains,
    Voters,
    Proposals,
    Votes,
}

/// A write prepared outside the transaction closure, which may be retried.
struct EncodedOp {
    key: RecordKey,
    tree: TreeKind,
    raw_key: Vec<u8>,
    value: Vec<u8>,
    insert: bool,
}

impl EncodedOp {
    fn encode(op: &WriteOp) -> Result<Self> {
        let record = op.record();
        let key = record.key();
        let (tree, value) = match record {
            Record::Domain(domain) => (TreeKind::Domains, serde_json::to_vec(domain)?),
            Record::Voter(voter) => (TreeKind::Voters, serde_json::to_vec(voter)?),
            Record::Proposal(proposal) => (TreeKind::Proposals, serde_json::to_vec(proposal)?),
            Record::Vote(vote) => (TreeKind::Votes, serde_json::to_vec(vote)?),
        };
        Ok(Self {
            key,
            tree,
            raw_key: key.to_bytes(),
            value,
            insert: matches!(op, WriteOp::Insert(_)),
        })
    }
}

/// Sled-backed implementation
///
/// One tree per record type; a batch runs as a single multi-tree transaction.
pub struct SledStorage {
    db: Db,
    domains: Tree,
    voters: Tree,
    proposals: Tree,
    votes: Tree,
}

impl SledStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let domains = db.open_tree("domains")?;
        let voters = db.open_tree("voters")?;
        let proposals = db.open_tree("proposals")?;
        let votes = db.open_tree("votes")?;

        tracing::info!(
            domains = domains.len(),
            proposals = proposals.len(),
            "Opened sled governance store"
        );

        Ok(Self {
            db,
            domains,
            voters,
            proposals,
            votes,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(tree: &Tree, key: &[u8]) -> Result<Option<T>> {
        tree.get(key)?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn scan<T: DeserializeOwned>(tree: &Tree, prefix: &[u8]) -> Result<Vec<T>> {
        tree.scan_prefix(prefix)
            .map(|entry| {
                let (_, v) = entry?;
                Ok(serde_json::from_slice::<T>(&v)?)
            })
            .collect()
    }
}

impl GovernanceStore for SledStorage {
    fn get_domain(&self, id: &DomainId) -> Result<Option<GovernanceDomain>> {
        Self::get(&self.domains, id.as_bytes())
    }

    fn get_voter(&self, key: &VoterKey) -> Result<Option<VoterRecord>> {
        Self::get(&self.voters, &key.to_bytes())
    }

    fn get_proposal(&self, key: &ProposalKey) -> Result<Option<Proposal>> {
        Self::get(&self.proposals, &key.to_bytes())
    }

    fn get_vote(&self, key: &VoteKey) -> Result<Option<Vote>> {
        Self::get(&self.votes, &key.to_bytes())
    }

    fn list_proposals(&self, domain: &DomainId) -> Result<Vec<Proposal>> {
        Self::scan(&self.proposals, domain.as_bytes())
    }

    fn list_votes(&self, proposal: &ProposalKey) -> Result<Vec<Vote>> {
        Self::scan(&self.votes, &proposal.to_bytes())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let encoded = batch
            .ops()
            .iter()
            .map(EncodedOp::encode)
            .collect::<Result<Vec<_>>>()?;

        (&self.domains, &self.voters, &self.proposals, &self.votes)
            .transaction(|(domains, voters, proposals, votes)| {
                for op in &encoded {
                    let tree = match op.tree {
                        TreeKind::Domains => domains,
                        TreeKind::Voters => voters,
                        TreeKind::Proposals => proposals,
                        TreeKind::Votes => votes,
                    };
                    let exists = tree.get(op.raw_key.as_slice())?.is_some();
                    if op.insert && exists {
                        return Err(ConflictableTransactionError::Abort(
                            StorageError::KeyExists(op.key),
                        ));
                    }
                    if !op.insert && !exists {
                        return Err(ConflictableTransactionError::Abort(
                            StorageError::MissingRecord(op.key),
                        ));
                    }
                    tree.insert(op.raw_key.as_slice(), op.value.as_slice())?;
                }
                Ok(())
            })
            .map_err(|err| match err {
                TransactionError::Abort(err) => err,
                TransactionError::Storage(err) => StorageError::Database(err),
            })?;

        tracing::trace!(ops = encoded.len(), "sled batch committed");
        Ok(())
    }
}
