//! Voter registry: one record per (domain, voter).

use crate::error::{GovernanceError, Result};
use qv_types::{Address, GovernanceDomain, VoterRecord};

/// Fresh registration granting the domain's credit allowance.
pub fn register(domain: &GovernanceDomain, voter: Address) -> VoterRecord {
    VoterRecord {
        domain: domain.id,
        voter,
        credits_remaining: domain.voice_credits_per_voter,
        credits_spent: 0,
        proposals_voted_on: 0,
    }
}

/// Unwrap a looked-up registration, failing for unknown voters.
pub fn require_registered(record: Option<VoterRecord>, voter: Address) -> Result<VoterRecord> {
    record.ok_or(GovernanceError::NotRegistered { voter })
}

/// Count one more vote against the registration.
pub fn record_participation(record: &mut VoterRecord) {
    record.proposals_voted_on = record.proposals_voted_on.saturating_add(1);
}
