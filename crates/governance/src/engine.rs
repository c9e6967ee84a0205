//! Governance engine: the five surface operations plus read-only queries.
//!
//! Every mutating operation holds the write lane across load, validation and
//! commit, and commits its records as a single [`WriteBatch`]. A rejected
//! operation therefore leaves the store exactly as it found it.

use crate::domain::{self, DomainParams};
use crate::error::{GovernanceError, Result};
use crate::holdings::{AccountRef, BalanceOracle};
use crate::proposals::{self, ProposalDraft};
use crate::registry;
use crate::settings::GovernanceSettings;
use crate::votes;
use parking_lot::Mutex;
use qv_storage::{GovernanceStore, StorageError, WriteBatch};
use qv_time::Clock;
use qv_types::{
    Address, DomainId, GovernanceDomain, Proposal, ProposalId, ProposalKey, ProposalOutcome,
    RecordKey, ResourceId, Vote, VoteKey, VoterKey, VoterRecord,
};
use tracing::{info, warn};

/// A proposal closed by [`GovernanceEngine::finalize_proposal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedProposal {
    pub proposal: Proposal,
    pub outcome: ProposalOutcome,
}

pub struct GovernanceEngine<S, C, O> {
    store: S,
    clock: C,
    oracle: O,
    settings: GovernanceSettings,
    write_lane: Mutex<()>,
}

impl<S, C, O> GovernanceEngine<S, C, O>
where
    S: GovernanceStore,
    C: Clock,
    O: BalanceOracle,
{
    pub fn new(store: S, clock: C, oracle: O) -> Self {
        Self::with_settings(store, clock, oracle, GovernanceSettings::default())
    }

    pub fn with_settings(store: S, clock: C, oracle: O, settings: GovernanceSettings) -> Self {
        Self {
            store,
            clock,
            oracle,
            settings,
            write_lane: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn settings(&self) -> &GovernanceSettings {
        &self.settings
    }

    // ---------------------------------------------------------------------
    // Surface operations
    // ---------------------------------------------------------------------

    /// Create the domain owned by `admin`. At most one per admin.
    pub fn initialize_governance(
        &self,
        admin: Address,
        governance_resource: ResourceId,
        voice_credits_per_voter: u64,
        voting_period: u64,
    ) -> Result<GovernanceDomain> {
        let params = DomainParams {
            governance_resource,
            voice_credits_per_voter,
            voting_period,
        };
        let result = {
            let _lane = self.write_lane.lock();
            self.try_initialize(admin, params)
        };

        match &result {
            Ok(domain) => info!(
                domain = %domain.id,
                admin = %admin,
                voice_credits_per_voter,
                voting_period,
                "Governance initialized"
            ),
            Err(err) => warn!(admin = %admin, error = %err, "initialize_governance rejected"),
        }
        result
    }

    /// Register `voter` in `domain_id`, granting the domain's allowance.
    pub fn register_voter(&self, domain_id: &DomainId, voter: Address) -> Result<VoterRecord> {
        let result = {
            let _lane = self.write_lane.lock();
            self.try_register(domain_id, voter)
        };

        match &result {
            Ok(record) => info!(
                domain = %domain_id,
                voter = %voter,
                credits = record.credits_remaining,
                "Voter registered"
            ),
            Err(err) => warn!(domain = %domain_id, voter = %voter, error = %err, "register_voter rejected"),
        }
        result
    }

    /// Open a proposal authored by the registered voter `proposer`.
    pub fn create_proposal(
        &self,
        domain_id: &DomainId,
        proposer: Address,
        title_hash: [u8; 32],
        description_uri: impl Into<String>,
    ) -> Result<Proposal> {
        let draft = ProposalDraft::new(title_hash, description_uri);
        let result = {
            let _lane = self.write_lane.lock();
            self.try_create_proposal(domain_id, proposer, draft)
        };

        match &result {
            Ok(proposal) => info!(
                domain = %domain_id,
                proposal_id = proposal.proposal_id,
                proposer = %proposer,
                ends_at = proposal.end_time,
                "Proposal created"
            ),
            Err(err) => warn!(domain = %domain_id, proposer = %proposer, error = %err, "create_proposal rejected"),
        }
        result
    }

    /// Cast `voter`'s single vote on a proposal, weighted by the balance of
    /// `holding_account`.
    pub fn cast_vote(
        &self,
        domain_id: &DomainId,
        proposal_id: ProposalId,
        voter: Address,
        holding_account: &AccountRef,
        raw_vote_type: u8,
    ) -> Result<Vote> {
        let result = {
            let _lane = self.write_lane.lock();
            self.try_cast_vote(domain_id, proposal_id, voter, holding_account, raw_vote_type)
        };

        match &result {
            Ok(vote) => info!(
                domain = %domain_id,
                proposal_id,
                voter = %voter,
                vote = %vote.vote_type,
                weight = vote.voting_credits,
                "Vote cast"
            ),
            Err(err) => warn!(
                domain = %domain_id,
                proposal_id,
                voter = %voter,
                error = %err,
                "cast_vote rejected"
            ),
        }
        result
    }

    /// Close a proposal whose voting period has elapsed. Any caller may do so.
    pub fn finalize_proposal(
        &self,
        domain_id: &DomainId,
        proposal_id: ProposalId,
        caller: Address,
    ) -> Result<FinalizedProposal> {
        let result = {
            let _lane = self.write_lane.lock();
            self.try_finalize(domain_id, proposal_id)
        };

        match &result {
            Ok(done) => info!(
                domain = %domain_id,
                proposal_id,
                caller = %caller,
                yes = done.proposal.yes_votes,
                no = done.proposal.no_votes,
                net = %done.proposal.net_votes(),
                outcome = %done.outcome,
                "Proposal finalized"
            ),
            Err(err) => warn!(
                domain = %domain_id,
                proposal_id,
                caller = %caller,
                error = %err,
                "finalize_proposal rejected"
            ),
        }
        result
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn domain(&self, domain_id: &DomainId) -> Result<GovernanceDomain> {
        self.load_domain(domain_id)
    }

    /// Domain owned by `admin`, if one was initialized.
    pub fn domain_of(&self, admin: &Address) -> Result<Option<GovernanceDomain>> {
        Ok(self.store.get_domain(&DomainId::derive(admin))?)
    }

    pub fn voter(&self, domain_id: &DomainId, voter: &Address) -> Result<Option<VoterRecord>> {
        Ok(self.store.get_voter(&VoterKey::new(*domain_id, *voter))?)
    }

    pub fn proposal(&self, domain_id: &DomainId, proposal_id: ProposalId) -> Result<Proposal> {
        self.load_proposal(domain_id, proposal_id)
    }

    pub fn vote(
        &self,
        domain_id: &DomainId,
        proposal_id: ProposalId,
        voter: &Address,
    ) -> Result<Option<Vote>> {
        let key = VoteKey::new(ProposalKey::new(*domain_id, proposal_id), *voter);
        Ok(self.store.get_vote(&key)?)
    }

    /// Proposals of a domain in id order.
    pub fn proposals(&self, domain_id: &DomainId) -> Result<Vec<Proposal>> {
        Ok(self.store.list_proposals(domain_id)?)
    }

    pub fn votes(&self, domain_id: &DomainId, proposal_id: ProposalId) -> Result<Vec<Vote>> {
        Ok(self
            .store
            .list_votes(&ProposalKey::new(*domain_id, proposal_id))?)
    }

    /// Outcome of a finalized proposal; `None` while voting is still open.
    pub fn outcome(
        &self,
        domain_id: &DomainId,
        proposal_id: ProposalId,
    ) -> Result<Option<ProposalOutcome>> {
        let proposal = self.load_proposal(domain_id, proposal_id)?;
        Ok(proposal.finalized.then(|| proposal.outcome()))
    }

    // ---------------------------------------------------------------------
    // Transitions (caller holds the write lane)
    // ---------------------------------------------------------------------

    fn try_initialize(&self, admin: Address, params: DomainParams) -> Result<GovernanceDomain> {
        let domain = domain::initialize(admin, params)?;
        if self.store.get_domain(&domain.id)?.is_some() {
            return Err(GovernanceError::AlreadyInitialized(domain.id));
        }
        self.commit(WriteBatch::new().insert(domain.clone()))?;
        Ok(domain)
    }

    fn try_register(&self, domain_id: &DomainId, voter: Address) -> Result<VoterRecord> {
        let domain = self.load_domain(domain_id)?;
        let record = registry::register(&domain, voter);
        if self.store.get_voter(&record.key())?.is_some() {
            return Err(GovernanceError::AlreadyRegistered { voter });
        }
        self.commit(WriteBatch::new().insert(record.clone()))?;
        Ok(record)
    }

    fn try_create_proposal(
        &self,
        domain_id: &DomainId,
        proposer: Address,
        draft: ProposalDraft,
    ) -> Result<Proposal> {
        let mut domain = self.load_domain(domain_id)?;
        let author = self.load_voter(domain_id, proposer)?;
        let proposal = proposals::open(
            &mut domain,
            &author,
            draft,
            self.clock.now(),
            self.settings.max_description_uri_len,
        )?;
        self.commit(
            WriteBatch::new()
                .insert(proposal.clone())
                .update(domain),
        )?;
        Ok(proposal)
    }

    fn try_cast_vote(
        &self,
        domain_id: &DomainId,
        proposal_id: ProposalId,
        voter: Address,
        holding_account: &AccountRef,
        raw_vote_type: u8,
    ) -> Result<Vote> {
        let domain = self.load_domain(domain_id)?;
        let proposal = self.load_proposal(domain_id, proposal_id)?;
        let record = self.load_voter(domain_id, voter)?;
        let existing = self
            .store
            .get_vote(&VoteKey::new(proposal.key(), voter))?;
        let now = self.clock.now();
        let vote_type =
            votes::check_preconditions(&proposal, raw_vote_type, existing.as_ref(), voter, now)?;

        // Single balance read; the same snapshot weighs the vote and the tally.
        let holding = self.oracle.holding(holding_account)?;
        let cast = votes::cast(
            &domain,
            &proposal,
            &record,
            vote_type,
            &holding,
            now,
        )?;

        self.commit(
            WriteBatch::new()
                .insert(cast.vote.clone())
                .update(cast.proposal)
                .update(cast.voter),
        )?;
        Ok(cast.vote)
    }

    fn try_finalize(
        &self,
        domain_id: &DomainId,
        proposal_id: ProposalId,
    ) -> Result<FinalizedProposal> {
        self.load_domain(domain_id)?;
        let mut proposal = self.load_proposal(domain_id, proposal_id)?;
        let outcome = proposals::finalize(&mut proposal, self.clock.now())?;
        self.commit(WriteBatch::new().update(proposal.clone()))?;
        Ok(FinalizedProposal { proposal, outcome })
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn load_voter(&self, domain_id: &DomainId, voter: Address) -> Result<VoterRecord> {
        registry::require_registered(
            self.store.get_voter(&VoterKey::new(*domain_id, voter))?,
            voter,
        )
    }

    fn load_domain(&self, domain_id: &DomainId) -> Result<GovernanceDomain> {
        self.store
            .get_domain(domain_id)?
            .ok_or(GovernanceError::DomainNotFound(*domain_id))
    }

    fn load_proposal(&self, domain_id: &DomainId, proposal_id: ProposalId) -> Result<Proposal> {
        self.store
            .get_proposal(&ProposalKey::new(*domain_id, proposal_id))?
            .ok_or(GovernanceError::ProposalNotFound(proposal_id))
    }

    /// Commit a batch, mapping create-if-absent collisions to domain errors.
    fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.store.commit(batch).map_err(|err| match err {
            StorageError::KeyExists(RecordKey::Domain(id)) => {
                GovernanceError::AlreadyInitialized(id)
            }
            StorageError::KeyExists(RecordKey::Voter(key)) => {
                GovernanceError::AlreadyRegistered { voter: key.voter }
            }
            StorageError::KeyExists(RecordKey::Vote(key)) => GovernanceError::AlreadyVoted {
                proposal_id: key.proposal.proposal_id,
                voter: key.voter,
            },
            other => GovernanceError::Storage(other),
        })
    }
}
