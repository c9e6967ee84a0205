//! Governance domain lifecycle: creation and proposal id allocation.

use crate::error::{GovernanceError, Result};
use qv_types::{Address, DomainId, GovernanceDomain, ProposalId, ResourceId};

/// Parameters fixed when a domain is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainParams {
    pub governance_resource: ResourceId,
    pub voice_credits_per_voter: u64,
    pub voting_period: u64,
}

impl DomainParams {
    pub fn validate(&self) -> Result<()> {
        if self.voice_credits_per_voter == 0 {
            return Err(GovernanceError::InvalidCreditAllocation);
        }
        if self.voting_period == 0 {
            return Err(GovernanceError::InvalidVotingPeriod);
        }
        Ok(())
    }
}

/// Build the domain record owned by `admin`.
///
/// The id is derived from the admin alone, so an admin has at most one domain.
pub fn initialize(admin: Address, params: DomainParams) -> Result<GovernanceDomain> {
    params.validate()?;
    Ok(GovernanceDomain {
        id: DomainId::derive(&admin),
        admin,
        governance_resource: params.governance_resource,
        voice_credits_per_voter: params.voice_credits_per_voter,
        voting_period: params.voting_period,
        proposal_count: 0,
    })
}

/// Hand out the next proposal id and advance the counter.
pub fn allocate_proposal_id(domain: &mut GovernanceDomain) -> Result<ProposalId> {
    let id = domain.proposal_count;
    domain.proposal_count = id
        .checked_add(1)
        .ok_or(GovernanceError::ProposalCountOverflow)?;
    Ok(id)
}
