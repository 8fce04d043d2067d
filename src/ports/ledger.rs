use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::{Account, Transaction};

/// Registry of account ledgers and the operations that mutate them
///
/// Operations against the same account are serialized. Operations against different accounts
/// may run in parallel.
#[mockall::automock]
#[async_trait::async_trait]
pub trait LedgerPort {
    /// Identifiers of all known accounts, in no particular order
    async fn list_accounts(&self) -> Result<Vec<String>, Error>;

    /// Snapshot of an account, if it exists
    async fn get_account(&self, account_id: String) -> Result<Option<Account>, Error>;

    /// Available points per payer
    ///
    /// Unknown accounts have no balances.
    async fn get_balances(&self, account_id: String) -> Result<BTreeMap<String, i64>, Error>;

    /// Record points for a payer, creating the account on first use
    async fn grant(
        &self,
        account_id: String,
        payer: String,
        points: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, Error>;

    /// Deduct `amount` points from the account, oldest grants first
    ///
    /// Either all deductions are applied or none are.
    async fn spend(&self, account_id: String, amount: i64) -> Result<Vec<Transaction>, Error>;

    /// Delete an account and its history
    ///
    /// Returns `false` if the account did not exist.
    async fn remove_account(&self, account_id: String) -> Result<bool, Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Spending against an account that was never granted any points
    #[error("account {0} does not exist")]
    AccountNotFound(String),

    /// The unconsumed points of the account do not cover the spend
    #[error("account {account_id} does not have enough points to spend {requested}: {shortfall} more needed")]
    NotEnoughPoints {
        account_id: String,
        requested: i64,
        shortfall: i64,
    },

    /// The points would push the payer's balance out of range
    ///
    /// Nothing is applied to the account.
    #[error("applying {points} points for payer {payer} overflows the balance of account {account_id}")]
    PointsOverflow {
        account_id: String,
        payer: String,
        points: i64,
    },

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as a poisoned lock.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
