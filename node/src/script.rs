//! Scripted replay of governance operations.
//!
//! A script is a JSON document listing operations in submission order. Each
//! step may carry an `at` timestamp; the ledger clock jumps forward to it
//! before the step runs. Identities are written either as `q`-prefixed
//! addresses or as free-form labels (`"alice"`), which map to a stable
//! address derived from the label.

use anyhow::{Context, Result};
use qv_governance::{GovernanceEngine, InMemoryHoldings};
use qv_storage::GovernanceStore;
use qv_time::{Clock, ManualClock};
use qv_types::{Address, DomainId, ProposalId, UnixSeconds};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

const LABEL_DOMAIN: &[u8] = b"qv-script-identity";

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Initial ledger time; defaults to the wall clock.
    #[serde(default)]
    pub start_time: Option<UnixSeconds>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(default)]
    pub at: Option<UnixSeconds>,
    #[serde(flatten)]
    pub op: Operation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    OpenAccount {
        account: String,
        owner: String,
        resource: String,
    },
    Mint {
        account: String,
        amount: u64,
    },
    Burn {
        account: String,
        amount: u64,
    },
    Advance {
        seconds: u64,
    },
    InitializeGovernance {
        admin: String,
        governance_resource: String,
        voice_credits_per_voter: u64,
        voting_period: u64,
    },
    RegisterVoter {
        admin: String,
        voter: String,
    },
    CreateProposal {
        admin: String,
        proposer: String,
        /// Hashed with BLAKE3 into the proposal's title hash.
        title: String,
        description_uri: String,
    },
    CastVote {
        admin: String,
        proposal_id: ProposalId,
        voter: String,
        holding_account: String,
        vote_type: u8,
    },
    FinalizeProposal {
        admin: String,
        proposal_id: ProposalId,
        caller: String,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::OpenAccount { .. } => "open_account",
            Operation::Mint { .. } => "mint",
            Operation::Burn { .. } => "burn",
            Operation::Advance { .. } => "advance",
            Operation::InitializeGovernance { .. } => "initialize_governance",
            Operation::RegisterVoter { .. } => "register_voter",
            Operation::CreateProposal { .. } => "create_proposal",
            Operation::CastVote { .. } => "cast_vote",
            Operation::FinalizeProposal { .. } => "finalize_proposal",
        }
    }
}

/// Resolve an identity written in a script.
pub fn resolve_identity(value: &str) -> Address {
    value.parse().unwrap_or_else(|_| {
        let mut hasher = blake3::Hasher::new();
        hasher.update(LABEL_DOMAIN);
        hasher.update(value.as_bytes());
        Address::new(*hasher.finalize().as_bytes())
    })
}

fn domain_of(admin: &str) -> DomainId {
    DomainId::derive(&resolve_identity(admin))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok { record: Value },
    Rejected { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub at: UnixSeconds,
    pub op: &'static str,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl StepReport {
    pub fn is_rejected(&self) -> bool {
        matches!(self.outcome, StepOutcome::Rejected { .. })
    }
}

/// Replays scripts against a governance engine driven by a manual clock.
pub struct ScriptRunner<S> {
    engine: GovernanceEngine<S, ManualClock, InMemoryHoldings>,
}

impl<S: GovernanceStore> ScriptRunner<S> {
    pub fn new(engine: GovernanceEngine<S, ManualClock, InMemoryHoldings>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &GovernanceEngine<S, ManualClock, InMemoryHoldings> {
        &self.engine
    }

    /// Run every step in order. With `fail_fast` the first rejection stops
    /// the run; its report is still included.
    pub fn run(&self, script: &Script, fail_fast: bool) -> Result<Vec<StepReport>> {
        let clock = self.engine.clock();
        let mut reports = Vec::with_capacity(script.steps.len());

        for (index, step) in script.steps.iter().enumerate() {
            if let Some(at) = step.at {
                let now = clock.set(at);
                if now != at {
                    warn!(step = index, at, now, "step timestamp is in the past; clock not moved");
                }
            }

            let outcome = match self.apply(&step.op) {
                Ok(record) => StepOutcome::Ok { record },
                Err(err) => StepOutcome::Rejected {
                    error: format!("{err:#}"),
                },
            };
            let report = StepReport {
                step: index,
                at: clock.now(),
                op: step.op.name(),
                outcome,
            };
            debug!(step = index, op = report.op, rejected = report.is_rejected(), "step applied");

            let stop = fail_fast && report.is_rejected();
            reports.push(report);
            if stop {
                break;
            }
        }

        Ok(reports)
    }

    fn apply(&self, op: &Operation) -> Result<Value> {
        let engine = &self.engine;
        let value = match op {
            Operation::OpenAccount {
                account,
                owner,
                resource,
            } => {
                let account = resolve_identity(account);
                engine.oracle().open_account(
                    account,
                    resolve_identity(owner),
                    resolve_identity(resource),
                )?;
                serde_json::to_value(engine.oracle().holding_of(&account)?)?
            }
            Operation::Mint { account, amount } => {
                let account = resolve_identity(account);
                engine.oracle().mint(&account, *amount)?;
                serde_json::to_value(engine.oracle().holding_of(&account)?)?
            }
            Operation::Burn { account, amount } => {
                let account = resolve_identity(account);
                engine.oracle().burn(&account, *amount)?;
                serde_json::to_value(engine.oracle().holding_of(&account)?)?
            }
            Operation::Advance { seconds } => {
                let now = engine.clock().advance(*seconds);
                serde_json::json!({ "now": now })
            }
            Operation::InitializeGovernance {
                admin,
                governance_resource,
                voice_credits_per_voter,
                voting_period,
            } => serde_json::to_value(engine.initialize_governance(
                resolve_identity(admin),
                resolve_identity(governance_resource),
                *voice_credits_per_voter,
                *voting_period,
            )?)?,
            Operation::RegisterVoter { admin, voter } => serde_json::to_value(
                engine.register_voter(&domain_of(admin), resolve_identity(voter))?,
            )?,
            Operation::CreateProposal {
                admin,
                proposer,
                title,
                description_uri,
            } => serde_json::to_value(engine.create_proposal(
                &domain_of(admin),
                resolve_identity(proposer),
                *blake3::hash(title.as_bytes()).as_bytes(),
                description_uri.clone(),
            )?)?,
            Operation::CastVote {
                admin,
                proposal_id,
                voter,
                holding_account,
                vote_type,
            } => serde_json::to_value(engine.cast_vote(
                &domain_of(admin),
                *proposal_id,
                resolve_identity(voter),
                &resolve_identity(holding_account),
                *vote_type,
            )?)?,
            Operation::FinalizeProposal {
                admin,
                proposal_id,
                caller,
            } => {
                let done = engine.finalize_proposal(
                    &domain_of(admin),
                    *proposal_id,
                    resolve_identity(caller),
                )?;
                serde_json::json!({
                    "proposal": done.proposal,
                    "outcome": done.outcome,
                    "net_votes": done.proposal.net_votes().to_string(),
                })
            }
        };
        Ok(value)
    }
}
