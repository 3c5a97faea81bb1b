//! Account Store
//!
//! The external collaborator that owns account records and token balances.
//! The gate only reads accounts and asks for conditional debits.

pub mod http;
pub mod memory;

use crate::error::StoreError;
use crate::tier::AccountTier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use http::{HttpAccountStore, LedgerSettings};
pub use memory::InMemoryAccountStore;

/// Account snapshot as returned by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub tier: AccountTier,

    /// Balance at the time the snapshot was taken; may be stale.
    /// Stores must never report a negative balance; such records fail to decode.
    pub token_balance: u64,
}

impl Account {
    pub fn new(id: impl Into<String>, tier: AccountTier, token_balance: u64) -> Self {
        Self {
            id: id.into(),
            tier,
            token_balance,
        }
    }
}

/// Result of a conditional debit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// The amount was taken; balance after the debit
    Debited { new_balance: u64 },

    /// Balance was below the amount; nothing was taken
    Insufficient { available: u64 },
}

/// Storage of accounts and balances
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch the current account record
    async fn fetch_account(&self, account_id: &str) -> Result<Account, StoreError>;

    /// Decrement the balance by `amount` if and only if it is at least `amount`.
    ///
    /// Implementations must perform the check and the decrement as one atomic
    /// operation on the store side, and apply each `debit_id` at most once:
    /// a repeated id returns the outcome of the debit that already happened
    /// instead of taking the amount again.
    async fn conditional_debit(
        &self,
        account_id: &str,
        amount: u64,
        debit_id: &str,
    ) -> Result<DebitOutcome, StoreError>;

    /// Upper bound the store itself puts on one request, if it has one
    fn request_timeout(&self) -> Option<Duration> {
        None
    }
}
