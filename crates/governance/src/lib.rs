//! Quadratic-voting governance engine.
//!
//! Provides the governance primitives of a ledger program:
//! - Domain creation with a fixed credit allowance and voting period
//! - Voter registration, one record per participant
//! - Proposal creation with sequential ids per domain
//! - One vote per voter and proposal, weighted by `floor(sqrt(balance))`
//! - Time-gated finalization with a passed/rejected/tied outcome
//!
//! Transitions live in small pure modules ([`domain`], [`registry`],
//! [`proposals`], [`votes`], [`clock`]); [`GovernanceEngine`] loads records
//! from a [`qv_storage::GovernanceStore`], applies a transition and commits
//! the result atomically.

pub mod clock;
pub mod domain;
pub mod engine;
pub mod error;
pub mod holdings;
pub mod proposals;
pub mod registry;
pub mod settings;
pub mod votes;
pub mod weighting;

pub use clock::FinalizationClock;
pub use engine::{FinalizedProposal, GovernanceEngine};
pub use error::{GovernanceError, Result};
pub use holdings::{AccountRef, BalanceOracle, Holding, HoldingError, InMemoryHoldings};
pub use settings::{
    GovernanceSettings, LogFormat, LoggingSettings, Settings, SettingsError, StorageBackend,
    StorageSettings,
};
pub use weighting::vote_weight;

/// Governance engine version (for API introspection)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
