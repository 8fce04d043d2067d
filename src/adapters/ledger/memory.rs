use crate::{
    domain::{Account, Transaction},
    ports::ledger::{Error, LedgerPort},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

/// In-process ledger registry
///
/// Each account sits behind its own mutex. The registry itself is a `DashMap`, so the first
/// operation on a new account atomically decides which mutex guards it.
#[derive(Clone, Debug)]
pub struct MemoryLedger {
    accounts: Arc<DashMap<String, Arc<Mutex<Account>>>>,
}

impl MemoryLedger {
    fn account(&self, account_id: &str) -> Option<Arc<Mutex<Account>>> {
        self.accounts
            .get(account_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    fn account_or_create(&self, account_id: &str) -> Arc<Mutex<Account>> {
        let entry = self
            .accounts
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Account::new(account_id))));
        Arc::clone(entry.value())
    }
}

#[async_trait::async_trait]
impl LedgerPort for MemoryLedger {
    async fn list_accounts(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .accounts
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn get_account(&self, account_id: String) -> Result<Option<Account>, Error> {
        let Some(account) = self.account(&account_id) else {
            return Ok(None);
        };
        let snapshot = account.lock()?.clone();

        Ok(Some(snapshot))
    }

    async fn get_balances(&self, account_id: String) -> Result<BTreeMap<String, i64>, Error> {
        let Some(account) = self.account(&account_id) else {
            return Ok(BTreeMap::new());
        };
        let balances = account.lock()?.balances().clone();

        Ok(balances)
    }

    async fn grant(
        &self,
        account_id: String,
        payer: String,
        points: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, Error> {
        let account = self.account_or_create(&account_id);
        let mut account = account.lock()?;

        let transaction = Transaction::new(payer, points, timestamp);
        apply(&mut account, transaction.clone())?;

        Ok(transaction)
    }

    async fn spend(&self, account_id: String, amount: i64) -> Result<Vec<Transaction>, Error> {
        let account = self
            .account(&account_id)
            .ok_or_else(|| Error::AccountNotFound(account_id.clone()))?;
        let mut account = account.lock()?;

        // Nothing is applied unless the whole amount can be covered
        let deductions = account.allocate(amount, Utc::now()).map_err(|shortfall| {
            tracing::warn!(
                account_id = %account_id,
                requested = shortfall.requested,
                missing = shortfall.missing,
                "rejected spend"
            );
            Error::NotEnoughPoints {
                account_id: account_id.clone(),
                requested: shortfall.requested,
                shortfall: shortfall.missing,
            }
        })?;

        tracing::info!(
            account_id = %account_id,
            amount,
            deductions = ?deductions,
            "computed spend"
        );
        let mut staged = Account::clone(&account);
        for deduction in &deductions {
            apply(&mut staged, deduction.clone())?;
        }
        *account = staged;

        Ok(deductions)
    }

    async fn remove_account(&self, account_id: String) -> Result<bool, Error> {
        Ok(self.accounts.remove(&account_id).is_some())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self {
            accounts: Arc::new(DashMap::new()),
        }
    }
}

/// Apply a transaction to an account, reporting anomalies
fn apply(account: &mut Account, transaction: Transaction) -> Result<(), Error> {
    tracing::info!(
        account_id = %account.account_id,
        payer = %transaction.payer,
        points = transaction.points,
        timestamp = %transaction.timestamp,
        "applying transaction"
    );
    let anomaly = account.apply(transaction).map_err(|overflow| {
        tracing::warn!(
            account_id = %account.account_id,
            error = %overflow,
            "rejected transaction"
        );
        Error::PointsOverflow {
            account_id: account.account_id.clone(),
            payer: overflow.payer,
            points: overflow.points,
        }
    })?;
    if let Some(anomaly) = anomaly {
        tracing::error!(
            account_id = %account.account_id,
            anomaly = %anomaly,
            "anomalous transaction"
        );
    }

    Ok(())
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(String);

/// We need to create a custom `From` implementation here for an error that's specific to this
/// adapter.
impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
