use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A single movement of points attributed to a payer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Identifier of the payer the points are attributed to
    pub payer: String,
    /// Difference in points
    ///
    /// A positive number grants points to the account. A negative number deducts from it.
    pub points: i64,
    /// Instant used to order the account history
    ///
    /// Deductions generated by a spend carry the time of the spend, not the time of the grant
    /// they consume.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(payer: impl Into<String>, points: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            payer: payer.into(),
            points,
            timestamp,
        }
    }
}

/// Diagnostic raised while applying a transaction
///
/// Anomalies never block a transaction. They flag data-quality problems, such as grants
/// submitted out of order with negative values, for operational alerting.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Anomaly {
    /// The available balance of a payer dropped below zero
    #[error("available points for payer {payer} went negative: {previous} + {points}")]
    NegativeBalance {
        payer: String,
        previous: i64,
        points: i64,
    },

    /// A transaction without any points reached the ledger
    ///
    /// Callers are expected to reject these before they get here.
    #[error("transaction for payer {payer} has a point value of 0")]
    ZeroPoints { payer: String },
}

/// Returned when a transaction would push a payer's balance or cursor out of range
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("applying {points} points for payer {payer} overflows its balance")]
pub struct PointsOverflow {
    pub payer: String,
    pub points: i64,
}

/// Returned when the unconsumed points of an account cannot cover a spend
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("not enough points to spend {requested}: {missing} more needed")]
pub struct Shortfall {
    pub requested: i64,
    pub missing: i64,
}

/// Ledger of a single account
///
/// The transaction history is append-only and is the source of truth. Balances are derived
/// from it as transactions get applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub account_id: String,

    /// Transactions in ascending timestamp order
    transactions: Vec<Transaction>,

    /// Current balance per payer
    available_by_payer: BTreeMap<String, i64>,

    /// Consumption cursor per payer
    ///
    /// Number of points deducted from the payer that the allocation walk has to skip over
    /// before it can take from the payer's grants again.
    spent_by_payer: BTreeMap<String, i64>,
}

impl Account {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            transactions: Vec::default(),
            available_by_payer: BTreeMap::default(),
            spent_by_payer: BTreeMap::default(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn balances(&self) -> &BTreeMap<String, i64> {
        &self.available_by_payer
    }

    pub fn spent(&self) -> &BTreeMap<String, i64> {
        &self.spent_by_payer
    }

    /// Record a transaction and update the balances of its payer
    ///
    /// This is used both for grants and for the deductions generated by a spend. The
    /// transaction is always applied, any [`Anomaly`] is only reported back. A transaction whose
    /// points would overflow the payer's balance or cursor is rejected and leaves the account
    /// untouched.
    pub fn apply(&mut self, transaction: Transaction) -> Result<Option<Anomaly>, PointsOverflow> {
        let overflow = || PointsOverflow {
            payer: transaction.payer.clone(),
            points: transaction.points,
        };

        let previous = self
            .available_by_payer
            .get(&transaction.payer)
            .copied()
            .unwrap_or_default();
        let available = previous
            .checked_add(transaction.points)
            .ok_or_else(overflow)?;

        let spent = self
            .spent_by_payer
            .get(&transaction.payer)
            .copied()
            .unwrap_or_default();
        let spent = if transaction.points < 0 {
            transaction
                .points
                .checked_neg()
                .and_then(|deducted| spent.checked_add(deducted))
                .ok_or_else(overflow)?
        } else {
            spent
        };

        let anomaly = if transaction.points == 0 {
            Some(Anomaly::ZeroPoints {
                payer: transaction.payer.clone(),
            })
        } else if available < 0 {
            Some(Anomaly::NegativeBalance {
                payer: transaction.payer.clone(),
                previous,
                points: transaction.points,
            })
        } else {
            None
        };

        self.available_by_payer
            .insert(transaction.payer.clone(), available);
        self.spent_by_payer.insert(transaction.payer.clone(), spent);

        // Equal timestamps keep their insertion order
        let index = self
            .transactions
            .partition_point(|existing| existing.timestamp <= transaction.timestamp);
        self.transactions.insert(index, transaction);

        Ok(anomaly)
    }

    /// Compute the deductions needed to spend `amount` points
    ///
    /// Grants are consumed oldest first. Grants whose points were already taken by earlier
    /// deductions are skipped using a copy of the consumption cursor, so this never mutates the
    /// account and returns the same result until the next [`Account::apply`].
    pub fn allocate(&self, amount: i64, now: DateTime<Utc>) -> Result<Vec<Transaction>, Shortfall> {
        let mut cursor = self.spent_by_payer.clone();
        let mut remaining = amount;
        let mut deductions = Vec::new();

        for grant in self.transactions.iter().filter(|t| t.points > 0) {
            if remaining <= 0 {
                break;
            }

            let skip = cursor.get(&grant.payer).copied().unwrap_or_default();
            if skip >= grant.points {
                // Fully consumed by earlier deductions
                cursor.insert(grant.payer.clone(), skip - grant.points);
                continue;
            }

            let take = (grant.points - skip).min(remaining);
            cursor.insert(grant.payer.clone(), 0);
            remaining -= take;
            deductions.push(Transaction::new(grant.payer.clone(), -take, now));
        }

        if remaining > 0 {
            return Err(Shortfall {
                requested: amount,
                missing: remaining,
            });
        }

        Ok(deductions)
    }
}
