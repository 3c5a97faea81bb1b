//! In-process account store.
//!
//! Balances and applied debit ids live behind one mutex, so the replay check,
//! the balance check and the decrement of a debit happen in a single critical
//! section.

use crate::error::StoreError;
use crate::store::{Account, AccountStore, DebitOutcome};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A debit that took tokens, kept so a replayed id returns the same outcome
#[derive(Debug, Clone)]
struct AppliedDebit {
    account_id: String,
    amount: u64,
    new_balance: u64,
}

#[derive(Debug, Default)]
struct Ledger {
    accounts: HashMap<String, Account>,
    applied: HashMap<String, AppliedDebit>,
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryAccountStore {
    inner: Arc<Mutex<Ledger>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account
    pub fn insert(&self, account: Account) {
        self.inner.lock().accounts.insert(account.id.clone(), account);
    }

    /// Current balance of an account
    pub fn balance(&self, account_id: &str) -> Option<u64> {
        self.inner.lock().accounts.get(account_id).map(|a| a.token_balance)
    }

    /// Add tokens to an account, returning the new balance
    pub fn credit(&self, account_id: &str, amount: u64) -> Result<u64, StoreError> {
        let mut guard = self.inner.lock();
        let account = guard
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))?;
        account.token_balance = account.token_balance.saturating_add(amount);
        Ok(account.token_balance)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn fetch_account(&self, account_id: &str) -> Result<Account, StoreError> {
        self.inner
            .lock()
            .accounts
            .get(account_id)
            .cloned()
            .ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))
    }

    async fn conditional_debit(
        &self,
        account_id: &str,
        amount: u64,
        debit_id: &str,
    ) -> Result<DebitOutcome, StoreError> {
        let mut guard = self.inner.lock();
        let ledger = &mut *guard;

        if let Some(applied) = ledger.applied.get(debit_id) {
            if applied.account_id != account_id || applied.amount != amount {
                return Err(StoreError::DebitIdConflict(debit_id.to_string()));
            }
            return Ok(DebitOutcome::Debited {
                new_balance: applied.new_balance,
            });
        }

        let account = ledger
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| StoreError::AccountNotFound(account_id.to_string()))?;

        match account.token_balance.checked_sub(amount) {
            Some(new_balance) => {
                account.token_balance = new_balance;
                ledger.applied.insert(
                    debit_id.to_string(),
                    AppliedDebit {
                        account_id: account_id.to_string(),
                        amount,
                        new_balance,
                    },
                );
                Ok(DebitOutcome::Debited { new_balance })
            }
            None => Ok(DebitOutcome::Insufficient {
                available: account.token_balance,
            }),
        }
    }
}
