use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::Transaction;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Request body sent either as a JSON object or as a JSON string holding that object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ObjectOrEncoded<T> {
    Object(T),
    Encoded(String),
}

impl<T: DeserializeOwned> ObjectOrEncoded<T> {
    pub fn into_inner(self) -> Result<T, serde_json::Error> {
        match self {
            ObjectOrEncoded::Object(body) => Ok(body),
            ObjectOrEncoded::Encoded(body) => serde_json::from_str(&body),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddPointsBody {
    pub payer: String,
    pub points: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SpendPointsBody {
    pub points: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionBody {
    pub payer: String,
    pub points: i64,
    pub timestamp: String,
}

impl From<Transaction> for TransactionBody {
    fn from(transaction: Transaction) -> Self {
        Self {
            timestamp: transaction.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            payer: transaction.payer,
            points: transaction.points,
        }
    }
}

/// Deduction generated by a spend
#[derive(Debug, Serialize)]
pub struct DeductionBody {
    pub payer: String,
    pub points: i64,
}

impl From<Transaction> for DeductionBody {
    fn from(transaction: Transaction) -> Self {
        Self {
            payer: transaction.payer,
            points: transaction.points,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountPointsBody {
    pub account_id: String,
    pub points: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize)]
pub struct AccountsBody {
    pub accounts: Vec<AccountPointsBody>,
}

#[derive(Debug, Serialize)]
pub struct AccountsRemovedBody {
    pub accounts_removed: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub version: &'static str,
}
