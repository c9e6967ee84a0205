//! Resource holdings consulted when weighting a vote.
//!
//! The engine never moves balances. It asks a [`BalanceOracle`] for the
//! holding behind an account reference, checks who owns it and which
//! resource it is denominated in, and reads the amount exactly once.

use parking_lot::RwLock;
use qv_types::{Address, ResourceId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Reference to a holding account.
pub type AccountRef = Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HoldingError {
    #[error("Holding account not found: {0}")]
    AccountNotFound(AccountRef),

    #[error("Holding account already exists: {0}")]
    AccountExists(AccountRef),

    #[error("Insufficient balance in {account}: has {available}, needs {requested}")]
    InsufficientBalance {
        account: AccountRef,
        available: u64,
        requested: u64,
    },

    #[error("Balance overflow in {0}")]
    Overflow(AccountRef),
}

/// Snapshot of one holding account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub owner: Address,
    pub resource: ResourceId,
    pub amount: u64,
}

/// Read-only view of resource balances.
pub trait BalanceOracle: Send + Sync {
    /// Current state of the holding behind `account`.
    fn holding(&self, account: &AccountRef) -> Result<Holding, HoldingError>;
}

impl<O: BalanceOracle + ?Sized> BalanceOracle for Arc<O> {
    fn holding(&self, account: &AccountRef) -> Result<Holding, HoldingError> {
        (**self).holding(account)
    }
}

// -----------------------------------------------------------------------------
// In-memory holdings (node runner and tests)
// -----------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct InMemoryHoldings {
    accounts: RwLock<HashMap<AccountRef, Holding>>,
    reads: AtomicU64,
}

impl InMemoryHoldings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty account for `owner` denominated in `resource`.
    pub fn open_account(
        &self,
        account: AccountRef,
        owner: Address,
        resource: ResourceId,
    ) -> Result<(), HoldingError> {
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account) {
            return Err(HoldingError::AccountExists(account));
        }
        accounts.insert(
            account,
            Holding {
                owner,
                resource,
                amount: 0,
            },
        );
        Ok(())
    }

    pub fn mint(&self, account: &AccountRef, amount: u64) -> Result<u64, HoldingError> {
        let mut accounts = self.accounts.write();
        let holding = accounts
            .get_mut(account)
            .ok_or(HoldingError::AccountNotFound(*account))?;
        holding.amount = holding
            .amount
            .checked_add(amount)
            .ok_or(HoldingError::Overflow(*account))?;
        Ok(holding.amount)
    }

    pub fn burn(&self, account: &AccountRef, amount: u64) -> Result<u64, HoldingError> {
        let mut accounts = self.accounts.write();
        let holding = accounts
            .get_mut(account)
            .ok_or(HoldingError::AccountNotFound(*account))?;
        if holding.amount < amount {
            return Err(HoldingError::InsufficientBalance {
                account: *account,
                available: holding.amount,
                requested: amount,
            });
        }
        holding.amount -= amount;
        Ok(holding.amount)
    }

    /// Inspect an account without counting as an oracle read.
    pub fn holding_of(&self, account: &AccountRef) -> Result<Holding, HoldingError> {
        self.accounts
            .read()
            .get(account)
            .copied()
            .ok_or(HoldingError::AccountNotFound(*account))
    }

    /// Number of oracle reads served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl BalanceOracle for InMemoryHoldings {
    fn holding(&self, account: &AccountRef) -> Result<Holding, HoldingError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let holding = self
            .accounts
            .read()
            .get(account)
            .copied()
            .ok_or(HoldingError::AccountNotFound(*account))?;
        tracing::debug!(%account, amount = holding.amount, "holding balance read");
        Ok(holding)
    }
}
